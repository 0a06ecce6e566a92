//! Scheduler lifecycle and the error-period scenario across sweeps

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{TimeDelta, Utc};
use endpoint_monitor::{
    actors::messages::{SchedulerState, StartOutcome, StopOutcome},
    clock::{Clock, ManualClock, SystemClock},
    storage::StateStore,
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_failing_then_recovering_endpoint() {
    let clock = ManualClock::new(Utc::now());
    let prober = Arc::new(
        ScriptedProber::new(Arc::new(clock.clone())).script("svc-b", &[false, false, false, true]),
    );
    let (monitor, store) = create_test_monitor(
        graphql_endpoints(&["svc-a", "svc-b"]),
        prober.clone(),
        None,
        Arc::new(clock.clone()),
    );

    let sweep_1 = clock.now();
    for sweep in 1..=3 {
        let report = monitor.scheduler().sweep_now().await.unwrap();
        assert_eq!(report.checked, 2, "sweep {sweep}");
        assert_eq!(report.unhealthy, 1, "sweep {sweep}");
        clock.advance(TimeDelta::seconds(60));
    }

    let histories = store.histories().await;
    let outcomes: Vec<bool> = histories["svc-b"].iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![false, false, false]);

    let periods = store.error_periods().await;
    assert_eq!(periods["svc-b"].len(), 1);
    assert_eq!(periods["svc-b"][0].start_time, sweep_1);
    assert_eq!(periods["svc-b"][0].end_time, None);
    assert!(periods["svc-a"].is_empty());

    let sweep_4 = clock.now();
    let report = monitor.scheduler().sweep_now().await.unwrap();
    assert_eq!(report.healthy, 2);

    let periods = store.error_periods().await;
    assert_eq!(periods["svc-b"].len(), 1);
    assert_eq!(periods["svc-b"][0].end_time, Some(sweep_4));
    assert!(periods["svc-a"].is_empty());

    assert_eq!(store.uptime("svc-a").await, Some(100.0));
    assert_eq!(store.uptime("svc-b").await, Some(25.0));
    assert_eq!(prober.calls("svc-b"), 4);

    monitor.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timer_drives_sweeps_until_stopped() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let prober = Arc::new(ScriptedProber::new(clock.clone()));
    let (monitor, store) =
        create_test_monitor(graphql_endpoints(&["svc-a"]), prober.clone(), None, clock);

    assert_matches!(monitor.start().await.unwrap(), StartOutcome::Started(_));
    assert_eq!(prober.calls("svc-a"), 1);

    tokio::time::sleep(Duration::from_secs(60 * 3 + 1)).await;
    assert_eq!(prober.calls("svc-a"), 4);
    assert_eq!(store.histories().await["svc-a"].len(), 4);

    assert_eq!(monitor.stop().await.unwrap(), StopOutcome::Stopped);
    assert_eq!(monitor.scheduler().state().await.unwrap(), SchedulerState::Idle);

    tokio::time::sleep(Duration::from_secs(60 * 5)).await;
    assert_eq!(prober.calls("svc-a"), 4);

    // restart sweeps immediately again
    assert_matches!(monitor.start().await.unwrap(), StartOutcome::Started(_));
    assert_eq!(prober.calls("svc-a"), 5);

    monitor.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_and_stop_are_idempotent() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let prober = Arc::new(ScriptedProber::new(clock.clone()));
    let (monitor, _store) =
        create_test_monitor(graphql_endpoints(&["svc-a"]), prober.clone(), None, clock);

    assert_eq!(monitor.stop().await.unwrap(), StopOutcome::NotRunning);
    assert_matches!(monitor.start().await.unwrap(), StartOutcome::Started(_));
    assert_eq!(monitor.start().await.unwrap(), StartOutcome::AlreadyRunning);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(prober.calls("svc-a"), 2);

    assert_eq!(monitor.stop().await.unwrap(), StopOutcome::Stopped);
    assert_eq!(monitor.stop().await.unwrap(), StopOutcome::NotRunning);

    monitor.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_slow_sweep_does_not_overlap() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    // each check takes longer than the sweep period
    let prober = Arc::new(
        ScriptedProber::new(clock.clone()).with_latency(|_, _| Duration::from_secs(90)),
    );
    let (monitor, store) =
        create_test_monitor(graphql_endpoints(&["svc-a"]), prober.clone(), None, clock);

    monitor.start().await.unwrap();
    assert_eq!(prober.calls("svc-a"), 1);

    // first tick fires 60s after the initial sweep completed
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(prober.calls("svc-a"), 2);
    assert_eq!(store.histories().await["svc-a"].len(), 1);

    // the late tick waits for the running sweep instead of overlapping it
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(store.histories().await["svc-a"].len(), 2);
    assert_eq!(prober.calls("svc-a"), 3);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_recovery_rearms_alerts() {
    let clock = ManualClock::new(Utc::now());
    let prober = Arc::new(
        ScriptedProber::new(Arc::new(clock.clone())).script("svc-b", &[false, false, true, false]),
    );
    let channel = Arc::new(RecordingChannel::default());
    let (monitor, _store) = create_test_monitor(
        graphql_endpoints(&["svc-b"]),
        prober,
        Some(channel.clone()),
        Arc::new(clock.clone()),
    );

    let mut dispatched = Vec::new();
    for _ in 0..4 {
        let report = monitor.scheduler().sweep_now().await.unwrap();
        dispatched.push(report.alerts_dispatched);

        // let the detached delivery record itself before the next sweep
        let expected: usize = dispatched.iter().sum();
        while channel.delivered.lock().unwrap().len() < expected
            || (report.alerts_dispatched > 0 && monitor.gate().last_notified("svc-b").is_none())
        {
            tokio::task::yield_now().await;
        }
        clock.advance(TimeDelta::seconds(60));
    }

    assert_eq!(dispatched, vec![1, 0, 0, 1]);

    let delivered = channel.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].ongoing_for, Some(Duration::ZERO));
    assert_eq!(delivered[1].ongoing_for, Some(Duration::ZERO));
    drop(delivered);

    monitor.shutdown().await.unwrap();
}
