//! RecurringTimer - 周期タイマー
//!
//! tokio task + `interval_at` で「period ごとに繰り返し呼ぶ、キャンセル可能」
//! なタイマーを提供する。`Zep` は同時に最大 1 つだけ保持する。

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Handle to a running recurring timer.
///
/// Dropping it detaches the task, it does not stop it. The tick closure
/// decides when to stop by returning `ControlFlow::Break`.
#[derive(Debug)]
pub(crate) struct RecurringTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl RecurringTimer {
    /// Spawn a timer whose first tick fires one `period` from now.
    ///
    /// `period` must be non-zero.
    pub(crate) fn spawn<F>(runtime: &Handle, period: Duration, generation: u64, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });

        Self { generation, handle }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the timer without waiting for it.
    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period_until_break() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&ticks);
        let _timer = RecurringTimer::spawn(&Handle::current(), Duration::from_millis(100), 1, move || {
            if t.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_further_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&ticks);
        let timer = RecurringTimer::spawn(&Handle::current(), Duration::from_millis(100), 7, move || {
            t.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        assert_eq!(timer.generation(), 7);

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        timer.cancel();
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}
