// tests/poller_tests.rs

mod common;

use common::{recorder, store_with, GatedProbe, ScriptedProbe, Step};
use factory_panel::connectivity::{HealthPoller, DEFAULT_POLL_INTERVAL};
use std::time::Duration;
use tokio::time::sleep;

const TICK: Duration = Duration::from_millis(1);

#[tokio::test(start_paused = true)]
async fn test_start_runs_one_check_immediately() {
    let probe = ScriptedProbe::always(true);
    let store = store_with(probe.clone());
    let mut poller = HealthPoller::new(store.clone(), DEFAULT_POLL_INTERVAL).unwrap();

    poller.start();
    sleep(TICK).await;

    assert_eq!(probe.calls(), 1);
    assert!(store.is_online());

    // Nothing else before the first interval elapses
    sleep(DEFAULT_POLL_INTERVAL - TICK * 2).await;
    assert_eq!(probe.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_checks_repeat_at_fixed_interval() {
    let probe = ScriptedProbe::always(true);
    let store = store_with(probe.clone());
    let mut poller = HealthPoller::new(store, DEFAULT_POLL_INTERVAL).unwrap();

    poller.start();
    sleep(TICK).await;

    for expected in 2..=6 {
        sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(probe.calls(), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cadence_does_not_depend_on_online_state() {
    // Offline for a while, then online: interval never changes
    let probe = ScriptedProbe::new([false, false, false, true, true]);
    let store = store_with(probe.clone());
    let mut poller = HealthPoller::new(store.clone(), DEFAULT_POLL_INTERVAL).unwrap();

    poller.start();
    sleep(TICK).await;

    for expected in 2..=5 {
        sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(probe.calls(), expected);
    }
    assert!(store.is_online());
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_fail_fail_ok_sequence() {
    let store = store_with(ScriptedProbe::new([false, false, true]));
    let (seen, listener) = recorder();
    let _subscription = store.subscribe(listener);
    let mut poller = HealthPoller::new(store, DEFAULT_POLL_INTERVAL).unwrap();

    poller.start();
    sleep(TICK).await;
    sleep(DEFAULT_POLL_INTERVAL * 2).await;
    poller.stop();

    assert_eq!(*seen.lock(), vec![false, false, true]);
}

#[tokio::test(start_paused = true)]
async fn test_no_checks_after_stop() {
    let probe = ScriptedProbe::always(true);
    let store = store_with(probe.clone());
    let mut poller = HealthPoller::new(store, DEFAULT_POLL_INTERVAL).unwrap();

    poller.start();
    sleep(TICK).await;
    sleep(DEFAULT_POLL_INTERVAL).await;
    assert_eq!(probe.calls(), 2);

    poller.stop();
    sleep(DEFAULT_POLL_INTERVAL * 10).await;
    assert_eq!(probe.calls(), 2);
    assert!(!poller.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_start_stop_leaves_nothing_running() {
    let probe = ScriptedProbe::always(true);
    let store = store_with(probe.clone());
    let mut poller = HealthPoller::new(store, DEFAULT_POLL_INTERVAL).unwrap();

    for cycle in 1..=5 {
        assert!(poller.start());
        sleep(TICK).await;
        assert!(poller.stop());
        // Each activation fires exactly its own immediate check
        assert_eq!(probe.calls(), cycle);
    }

    sleep(DEFAULT_POLL_INTERVAL * 10).await;
    assert_eq!(probe.calls(), 5);
    assert!(!poller.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_slow_checks_do_not_stretch_cadence() {
    // Each check outlives two periods
    let probe = ScriptedProbe::with_steps(
        std::iter::repeat(Step::ok().after(Duration::from_secs(4))).take(10),
    );
    let store = store_with(probe.clone());
    let mut poller = HealthPoller::new(store.clone(), Duration::from_secs(2)).unwrap();

    poller.start();
    sleep(TICK).await;
    assert_eq!(probe.calls(), 1);

    // Ticks at 2s and 4s start while the first check is still running
    sleep(Duration::from_secs(4)).await;
    assert_eq!(probe.calls(), 3);
    assert!(store.is_online());
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_check() {
    let probe = GatedProbe::new(true);
    let store = store_with(probe.clone());
    let (seen, listener) = recorder();
    let _subscription = store.subscribe(listener);
    let mut poller = HealthPoller::new(store.clone(), DEFAULT_POLL_INTERVAL).unwrap();

    poller.start();
    sleep(TICK).await;
    assert_eq!(probe.calls(), 1);

    poller.stop();
    probe.release();
    sleep(TICK).await;

    assert!(seen.lock().is_empty());
    assert_eq!(store.state().checks_completed, 0);
}
