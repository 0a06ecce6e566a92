//! In-memory state store (no persistence)
//!
//! Each endpoint gets its own partition behind its own mutex; the outer map is only
//! write-locked the first time an endpoint is seen. Concurrent checks of different endpoints
//! therefore never wait on each other.
//!
//! ## Limitations
//!
//! - **No persistence**: All state is lost on restart
//! - **Bounded history**: Only the last [`HISTORY_LIMIT`](super::state::HISTORY_LIMIT) results

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, trace};

use super::backend::StateStore;
use super::state::EndpointState;
use crate::clock::Clock;
use crate::model::{CheckResult, ErrorPeriod, HealthSnapshot, PeriodTransition, Status};

type Partition = Arc<Mutex<EndpointState>>;

/// In-memory state store
pub struct MemoryStore {
    clock: Arc<dyn Clock>,

    partitions: RwLock<HashMap<String, Partition>>,
}

impl MemoryStore {
    /// Create an empty store that timestamps records with `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of endpoints that have recorded at least one result
    pub async fn len(&self) -> usize {
        self.partitions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.partitions.read().await.is_empty()
    }

    async fn partition(&self, endpoint: &str) -> Partition {
        {
            let partitions = self.partitions.read().await;
            if let Some(partition) = partitions.get(endpoint) {
                return Arc::clone(partition);
            }
        }

        let mut partitions = self.partitions.write().await;
        Arc::clone(partitions.entry(endpoint.to_string()).or_insert_with(|| {
            debug!("tracking new endpoint {endpoint}");
            Arc::new(Mutex::new(EndpointState::default()))
        }))
    }

    /// Run `f` over every partition and collect the results keyed by endpoint
    async fn collect<T>(&self, f: impl Fn(&EndpointState) -> Option<T>) -> HashMap<String, T> {
        let partitions = self.partitions.read().await;
        let mut out = HashMap::with_capacity(partitions.len());

        for (endpoint, partition) in partitions.iter() {
            let state = partition.lock().await;
            if let Some(value) = f(&state) {
                out.insert(endpoint.clone(), value);
            }
        }

        out
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn record(&self, result: CheckResult) -> PeriodTransition {
        let partition = self.partition(&result.endpoint).await;
        let mut state = partition.lock().await;

        // taken under the partition lock so last_checked is monotonic per endpoint
        let now = self.clock.now();
        let endpoint = result.endpoint.clone();
        let transition = state.apply(result, now);

        trace!("{endpoint}: recorded result → {transition:?}");
        transition
    }

    async fn statuses(&self) -> HashMap<String, Status> {
        self.collect(|state| state.status().cloned()).await
    }

    async fn error_periods(&self) -> HashMap<String, Vec<ErrorPeriod>> {
        self.collect(|state| Some(state.error_periods().to_vec())).await
    }

    async fn histories(&self) -> HashMap<String, Vec<CheckResult>> {
        self.collect(|state| Some(state.history())).await
    }

    async fn uptime(&self, endpoint: &str) -> Option<f64> {
        let partition = {
            let partitions = self.partitions.read().await;
            partitions.get(endpoint).map(Arc::clone)
        }?;

        let state = partition.lock().await;
        state.uptime()
    }

    /// Consistent per endpoint: each endpoint's three values come from the same lock hold
    async fn snapshot(&self) -> HealthSnapshot {
        let partitions = self.partitions.read().await;
        let mut snapshot = HealthSnapshot::default();

        for (endpoint, partition) in partitions.iter() {
            let state = partition.lock().await;
            if let Some(status) = state.status() {
                snapshot.statuses.insert(endpoint.clone(), status.clone());
            }
            snapshot
                .error_periods
                .insert(endpoint.clone(), state.error_periods().to_vec());
            snapshot.histories.insert(endpoint.clone(), state.history());
        }

        snapshot
    }
}
