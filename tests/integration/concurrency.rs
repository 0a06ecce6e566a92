//! Concurrency tests
//!
//! These tests verify:
//! - Sweeps over many endpoints with random latencies keep the error-period invariants
//! - Readers polling during sweeps always see consistent per-endpoint state
//! - Concurrent writers on distinct endpoints do not interfere

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use endpoint_monitor::{
    CheckResult, ErrorPeriod,
    clock::{Clock, SystemClock},
    storage::{HISTORY_LIMIT, MemoryStore, StateStore},
};

use crate::helpers::*;

/// Deterministic pseudo-random value in `0..bound` for an (endpoint, index) pair
fn jitter(endpoint: &str, index: usize, bound: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    endpoint.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish() % bound
}

fn assert_invariants(
    periods: &HashMap<String, Vec<ErrorPeriod>>,
    histories: &HashMap<String, Vec<CheckResult>>,
) {
    for (endpoint, periods) in periods {
        let open: Vec<_> = periods.iter().filter(|p| p.is_open()).collect();
        assert!(open.len() <= 1, "{endpoint}: {} open periods", open.len());
        if !open.is_empty() {
            assert!(periods.last().unwrap().is_open(), "{endpoint}: open period is not last");
        }
        for pair in periods.windows(2) {
            assert!(pair[0].start_time <= pair[1].start_time, "{endpoint}: periods out of order");
        }
    }

    for (endpoint, history) in histories {
        assert!(history.len() <= HISTORY_LIMIT);
        for pair in history.windows(2) {
            assert!(
                pair[0].timestamp >= pair[1].timestamp,
                "{endpoint}: history is not most recent first"
            );
        }

        // latest outcome and the open period must agree
        if let Some(latest) = history.first() {
            let open = periods
                .get(endpoint)
                .and_then(|p| p.last())
                .is_some_and(ErrorPeriod::is_open);
            assert_eq!(open, !latest.success, "{endpoint}: status and periods disagree");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweeps_with_random_latency_keep_invariants() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let urls: Vec<String> = (0..24).map(|i| format!("svc-{i}")).collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();

    let mut prober = ScriptedProber::new(clock.clone())
        .with_latency(|endpoint, index| Duration::from_millis(jitter(endpoint, index, 15)));
    for url in &urls {
        let outcomes: Vec<bool> = (0..80).map(|i| jitter(url, i + 1000, 3) != 0).collect();
        prober = prober.script(url, &outcomes);
    }
    let prober = Arc::new(prober);

    let (monitor, store) =
        create_test_monitor(graphql_endpoints(&url_refs), prober.clone(), None, clock);

    // readers hammer the query surface while sweeps run
    let mut readers = Vec::new();
    for _ in 0..4 {
        let query = monitor.query().clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let snapshot = query.snapshot().await;
                assert_invariants(&snapshot.error_periods, &snapshot.histories);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }));
    }

    for _ in 0..70 {
        let report = monitor.scheduler().sweep_now().await.unwrap();
        assert_eq!(report.checked, urls.len());
        assert_eq!(report.healthy + report.unhealthy, urls.len());
    }

    for reader in futures::future::join_all(readers).await {
        reader.unwrap();
    }

    let snapshot = store.snapshot().await;
    assert_invariants(&snapshot.error_periods, &snapshot.histories);
    for url in &urls {
        assert_eq!(prober.calls(url), 70);
        assert_eq!(snapshot.histories[url].len(), HISTORY_LIMIT);
    }

    monitor.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_on_distinct_endpoints() {
    let store = Arc::new(MemoryStore::new(Arc::new(SystemClock)));

    let mut handles = Vec::new();
    for writer in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let endpoint = format!("svc-{writer}");
            for i in 0..100 {
                let success = jitter(&endpoint, i, 4) != 0;
                store
                    .record(CheckResult {
                        endpoint: endpoint.clone(),
                        success,
                        status_code: if success { 200 } else { 500 },
                        message: String::new(),
                        timestamp: chrono::Utc::now(),
                        response_time: Duration::from_millis(1),
                        error: None,
                    })
                    .await;
                tokio::task::yield_now().await;
            }
        }));
    }

    for joined in futures::future::join_all(handles).await {
        joined.unwrap();
    }

    assert_eq!(store.len().await, 16);
    let snapshot = store.snapshot().await;
    assert_invariants(&snapshot.error_periods, &snapshot.histories);
    for history in snapshot.histories.values() {
        assert_eq!(history.len(), HISTORY_LIMIT);
    }
}
