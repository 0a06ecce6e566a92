//! API shared state

use crate::actors::scheduler::SchedulerHandle;
use crate::monitor::Monitor;
use crate::query::QuerySurface;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Read-only view of the health state
    pub query: QuerySurface,

    /// Handle for start/stop and on-demand sweeps
    pub scheduler: SchedulerHandle,
}

impl ApiState {
    pub fn new(query: QuerySurface, scheduler: SchedulerHandle) -> Self {
        Self { query, scheduler }
    }
}

impl From<&Monitor> for ApiState {
    fn from(monitor: &Monitor) -> Self {
        Self::new(monitor.query().clone(), monitor.scheduler().clone())
    }
}
