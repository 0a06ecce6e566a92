use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::actors::messages::{StartOutcome, StopOutcome};
use crate::actors::scheduler::{SchedulerHandle, SweepContext};
use crate::alerts::{AlertChannel, AlertManager, channel_from_config};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, EndpointConfig};
use crate::monitors::cooldown::NotifierGate;
use crate::monitors::probe::{HttpProber, Prober};
use crate::query::QuerySurface;
use crate::storage::{MemoryStore, StateStore};

/// Components a monitor is assembled from
pub struct MonitorParts {
    pub endpoints: Vec<EndpointConfig>,
    pub prober: Arc<dyn Prober>,
    pub store: Arc<dyn StateStore>,
    pub channel: Option<Arc<dyn AlertChannel>>,
    pub clock: Arc<dyn Clock>,
    pub period: Duration,
}

/// A running set of scheduler, store and notifier gate
///
/// Owns the only scheduler for its store. Dropping every handle stops the scheduler task.
#[derive(Clone)]
pub struct Monitor {
    scheduler: SchedulerHandle,
    query: QuerySurface,
    gate: Arc<NotifierGate>,
}

impl Monitor {
    /// Assemble a monitor with the real prober, an in-memory store and the configured channel
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let channel = config.alert.as_ref().map(channel_from_config).transpose()?;

        Ok(Self::with_parts(MonitorParts {
            endpoints: config.endpoints.clone(),
            prober: Arc::new(HttpProber::new(clock.clone())?),
            store: Arc::new(MemoryStore::new(clock.clone())),
            channel,
            clock,
            period: Duration::from_secs(config.interval),
        }))
    }

    pub fn with_parts(parts: MonitorParts) -> Self {
        let endpoints = Arc::new(parts.endpoints);
        let gate = Arc::new(NotifierGate::new());
        let alerts = Arc::new(AlertManager::new(gate.clone(), parts.channel, parts.clock));

        debug!("monitoring {} endpoints", endpoints.len());

        let scheduler = SchedulerHandle::spawn(
            SweepContext {
                endpoints: endpoints.clone(),
                prober: parts.prober,
                store: parts.store.clone(),
                alerts,
            },
            parts.period,
        );

        Self {
            scheduler,
            query: QuerySurface::new(parts.store, endpoints),
            gate,
        }
    }

    pub async fn start(&self) -> Result<StartOutcome> {
        self.scheduler.start().await
    }

    pub async fn stop(&self) -> Result<StopOutcome> {
        self.scheduler.stop().await
    }

    /// Stop the timer and terminate the scheduler task
    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler.stop().await?;
        self.scheduler.shutdown().await;
        info!("monitor shut down");
        Ok(())
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    pub fn query(&self) -> &QuerySurface {
        &self.query
    }

    pub fn gate(&self) -> &Arc<NotifierGate> {
        &self.gate
    }
}
