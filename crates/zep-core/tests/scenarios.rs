//! Event-handler style scenarios: a source calls `run()` at a fixed interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use zep_core::{Zep, ZepStats};

/// Calls `run(param)` `iterations` times, one call every `every`.
async fn simulate<A: Clone + Send + 'static>(zep: &Zep<A>, iterations: usize, every: Duration, param: A) {
    for _ in 0..iterations {
        sleep(every).await;
        zep.run(param.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn period_coalesces_roughly_every_other_call() {
    let completed = Arc::new(AtomicUsize::new(0));
    let zep = Zep::new(|_: i64| {}, Some(Duration::from_millis(200))).unwrap();
    let c = Arc::clone(&completed);
    zep.on_completed(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    simulate(&zep, 10, Duration::from_millis(100), -1).await;
    sleep(Duration::from_millis(1000)).await;

    assert!(zep.execution_count() > 3);
    assert!(zep.execution_count() < 10);
    assert_eq!(zep.invocation_count(), 10);
    assert_eq!(zep.timers_count(), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn accumulated_value_reflects_several_executions() {
    let total = Arc::new(AtomicI64::new(0));
    let t = Arc::clone(&total);
    let zep = Zep::new(
        move |value: i64| {
            t.fetch_add(value, Ordering::SeqCst);
        },
        Some(Duration::from_millis(200)),
    )
    .unwrap();

    let final_total = Arc::new(AtomicI64::new(0));
    let (f, t) = (Arc::clone(&final_total), Arc::clone(&total));
    zep.on_completed(move |_| f.store(t.load(Ordering::SeqCst), Ordering::SeqCst));

    simulate(&zep, 10, Duration::from_millis(100), 5).await;
    sleep(Duration::from_millis(1000)).await;

    assert!(final_total.load(Ordering::SeqCst) > 10);
    assert_eq!(final_total.load(Ordering::SeqCst), total.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn immediate_mode_never_arms_a_timer() {
    let seen = Arc::new(AtomicI64::new(0));
    let s = Arc::clone(&seen);
    let zep = Zep::new(
        move |value: i64| {
            s.fetch_add(value, Ordering::SeqCst);
        },
        None,
    )
    .unwrap();

    simulate(&zep, 10, Duration::from_millis(100), 5).await;

    assert_eq!(zep.execution_count(), 10);
    assert_eq!(zep.invocation_count(), 10);
    assert_eq!(zep.timers_count(), 0);
    assert_eq!(seen.load(Ordering::SeqCst), 50);
}

#[tokio::test(start_paused = true)]
async fn executions_never_exceed_invocations() {
    let zep = Zep::new(|_: ()| {}, Some(Duration::from_millis(50))).unwrap();
    let snapshots = Arc::new(parking_lot::Mutex::new(Vec::<ZepStats>::new()));
    let s = Arc::clone(&snapshots);
    zep.on_after_run(move |stats| s.lock().push(*stats));

    for round in 0..30u64 {
        zep.run(());
        if round % 7 == 0 {
            zep.cancel();
        }
        if round % 11 == 10 {
            zep.abort();
        }
        sleep(Duration::from_millis(10 + (round * 13) % 90)).await;
        assert!(zep.execution_count() <= zep.invocation_count());
        if zep.is_running() {
            assert!(zep.is_waiting());
        }
    }
    sleep(Duration::from_millis(500)).await;

    assert!(zep.execution_count() <= zep.invocation_count());
    assert!(!snapshots.lock().is_empty());
    for stats in snapshots.lock().iter() {
        assert!(stats.executions < stats.calls);
    }
}

#[tokio::test(start_paused = true)]
async fn clones_drive_the_same_instance() {
    let zep = Zep::new(|_: u8| {}, Some(Duration::from_millis(200))).unwrap();
    let handler = zep.clone();

    let source = tokio::spawn(async move {
        simulate(&handler, 4, Duration::from_millis(30), 1).await;
    });
    source.await.unwrap();

    assert_eq!(zep.invocation_count(), 4);
    assert_eq!(zep.timers_count(), 1);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(zep.execution_count(), 1);
    assert_eq!(zep.stats().savings_percent(), 75.0);
}
