//! Helper types for integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use endpoint_monitor::{
    CheckResult, Monitor, MonitorParts,
    alerts::{AlertChannel, AlertError, AlertPayload},
    clock::Clock,
    config::EndpointConfig,
    monitors::probe::Prober,
    storage::{MemoryStore, StateStore},
};

/// Prober answering from a per-endpoint script, healthy once the script runs out
pub struct ScriptedProber {
    clock: Arc<dyn Clock>,
    scripts: Mutex<HashMap<String, VecDeque<bool>>>,
    latency: Box<dyn Fn(&str, usize) -> Duration + Send + Sync>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedProber {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            scripts: Mutex::new(HashMap::new()),
            latency: Box::new(|_, _| Duration::ZERO),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Queue outcomes for one endpoint, oldest first
    pub fn script(self, endpoint: &str, outcomes: &[bool]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), outcomes.iter().copied().collect());
        self
    }

    /// Latency as a function of endpoint and call index
    pub fn with_latency(
        mut self,
        latency: impl Fn(&str, usize) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.latency = Box::new(latency);
        self
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn check(&self, endpoint: &EndpointConfig) -> CheckResult {
        let timestamp = self.clock.now();
        let index = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(endpoint.url.clone()).or_insert(0);
            *count += 1;
            *count - 1
        };
        let success = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&endpoint.url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(true);

        let latency = (self.latency)(&endpoint.url, index);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        CheckResult {
            endpoint: endpoint.url.clone(),
            success,
            status_code: if success { 200 } else { 503 },
            message: if success {
                "server responded normally".to_string()
            } else {
                "server returned status 503".to_string()
            },
            timestamp,
            response_time: latency,
            error: None,
        }
    }
}

/// Alert channel that keeps every payload it is handed
#[derive(Default)]
pub struct RecordingChannel {
    pub delivered: Mutex<Vec<AlertPayload>>,
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, alert: &AlertPayload) -> Result<(), AlertError> {
        self.delivered.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub fn graphql_endpoints(urls: &[&str]) -> Vec<EndpointConfig> {
    urls.iter().map(|url| EndpointConfig::graphql(*url)).collect()
}

/// Assemble a monitor over an in-memory store
pub fn create_test_monitor(
    endpoints: Vec<EndpointConfig>,
    prober: Arc<ScriptedProber>,
    channel: Option<Arc<dyn AlertChannel>>,
    clock: Arc<dyn Clock>,
) -> (Monitor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let monitor = Monitor::with_parts(MonitorParts {
        endpoints,
        prober,
        store: store.clone() as Arc<dyn StateStore>,
        channel,
        clock,
        period: Duration::from_secs(60),
    });

    (monitor, store)
}
