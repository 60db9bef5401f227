//! zep-demo: drive a debouncer the way an event source would.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zep_core::{CancelPolicy, Zep, ZepConfig};

/// Simulate a burst of events and report how many were coalesced away.
#[derive(Parser, Debug)]
#[command(name = "zep-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of events to emit
    #[arg(long, default_value = "10")]
    calls: u32,

    /// Milliseconds between events
    #[arg(long, default_value = "100")]
    interval_ms: u64,

    /// Debounce period in milliseconds (<= 0 runs every event immediately)
    #[arg(long, default_value = "200", allow_negative_numbers = true)]
    period_ms: i64,

    /// Call cancel() right after this event
    #[arg(long)]
    cancel_after: Option<u32>,

    /// Call abort() right after this event
    #[arg(long)]
    abort_after: Option<u32>,

    /// Skip the callback on the tick that observes a cancel
    #[arg(long)]
    skip_cancelled: bool,
}

impl Cli {
    fn config(&self) -> ZepConfig {
        let policy = if self.skip_cancelled {
            CancelPolicy::SkipThisTick
        } else {
            CancelPolicy::RunThisTick
        };
        ZepConfig::from_millis(self.period_ms).cancel_policy(policy)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    // (A) callback: 最新のイベント番号だけを処理する
    let zep = Zep::with_config(
        |event: u32| {
            info!(event, "handling event");
        },
        config,
    )
    .context("failed to create debouncer")?;

    // (B) lifecycle handler
    let done = Arc::new(Notify::new());
    let d = Arc::clone(&done);
    zep.on_completed(move |stats| {
        info!(executions = stats.executions, "debounce cycle completed");
        d.notify_one();
    })
    .on_cancelled(|_| info!("cycle cancelled"))
    .on_aborted(|_| warn!("cycle aborted"))
    .on_error(|err| warn!(error = %err, "callback failed"));

    // (C) イベントを一定間隔で投入
    let every = Duration::from_millis(cli.interval_ms);
    for event in 1..=cli.calls {
        sleep(every).await;
        zep.run(event);
        if cli.cancel_after == Some(event) {
            zep.cancel();
        }
        if cli.abort_after == Some(event) {
            zep.abort();
        }
    }

    // (D) debounced mode なら quiescence まで待つ
    // cancel / abort された cycle は completed を出さないので上限付きで待つ
    if let Some(period) = zep.period()
        && timeout(period * 3, done.notified()).await.is_err()
    {
        info!("no completion observed, stopping");
    }

    zep.write_stats();
    Ok(())
}
