//! Read-only view over the health state
//!
//! Everything returned here is an owned snapshot, so callers may poll as often as they like
//! without holding any lock past the call.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EndpointConfig;
use crate::model::{CheckResult, EndpointUptime, ErrorPeriod, HealthSnapshot, Status};
use crate::storage::StateStore;

#[derive(Clone)]
pub struct QuerySurface {
    store: Arc<dyn StateStore>,
    endpoints: Arc<Vec<EndpointConfig>>,
}

impl QuerySurface {
    pub fn new(store: Arc<dyn StateStore>, endpoints: Arc<Vec<EndpointConfig>>) -> Self {
        Self { store, endpoints }
    }

    pub async fn statuses(&self) -> HashMap<String, Status> {
        self.store.statuses().await
    }

    pub async fn error_periods(&self) -> HashMap<String, Vec<ErrorPeriod>> {
        self.store.error_periods().await
    }

    pub async fn histories(&self) -> HashMap<String, Vec<CheckResult>> {
        self.store.histories().await
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        self.store.snapshot().await
    }

    pub async fn uptime(&self, endpoint: &str) -> Option<f64> {
        self.store.uptime(endpoint).await
    }

    /// Uptime of every configured endpoint, in configuration order
    pub async fn uptimes(&self) -> Vec<EndpointUptime> {
        let mut uptimes = Vec::with_capacity(self.endpoints.len());
        for endpoint in self.endpoints.iter() {
            uptimes.push(EndpointUptime {
                endpoint: endpoint.url.clone(),
                uptime_percentage: self.store.uptime(&endpoint.url).await,
            });
        }
        uptimes
    }

    /// Configured endpoint URLs, in configuration order
    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.url.clone()).collect()
    }
}
