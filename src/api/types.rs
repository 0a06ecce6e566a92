//! API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actors::messages::SweepReport;
use crate::model::EndpointUptime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsResponse {
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UptimeResponse {
    pub uptimes: Vec<EndpointUptime>,
}

/// Reply to start/stop requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResponse {
    pub success: bool,
    pub message: String,
}

impl MonitoringResponse {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
        }
    }
}

/// Reply to any request that failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Reply to an on-demand sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,

    /// Counts from the sweep that just ran
    pub report: SweepReport,
}
