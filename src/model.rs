//! Health data recorded per endpoint
//!
//! These are the values the store keeps and the query surface hands out. Field names serialize
//! in camelCase because the status page consuming them is a JavaScript front-end.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one probe against one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Endpoint this result belongs to
    pub endpoint: String,

    pub success: bool,

    /// HTTP status code, 0 if no response was received
    pub status_code: u16,

    /// Human-readable classification of the outcome
    pub message: String,

    /// When the check was initiated
    pub timestamp: DateTime<Utc>,

    #[serde(with = "crate::util::duration_ms")]
    pub response_time: Duration,

    /// Raw transport error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Most recent result for an endpoint plus the instant the store recorded it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(flatten)]
    pub result: CheckResult,

    pub last_checked: DateTime<Utc>,
}

/// A contiguous span during which an endpoint's checks were failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPeriod {
    pub start_time: DateTime<Utc>,

    /// `None` while the period is ongoing
    pub end_time: Option<DateTime<Utc>>,
}

impl ErrorPeriod {
    pub fn open(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Length of the period, measured up to `now` while it is still open
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).to_std().unwrap_or_default()
    }
}

/// What recording a result did to the endpoint's error periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodTransition {
    /// Healthy, and no period was open
    Healthy,

    /// First failure after a healthy or initial state
    Opened(ErrorPeriod),

    /// Failure while a period was already open
    Continued(ErrorPeriod),

    /// First success after a run of failures
    Closed(ErrorPeriod),
}

impl PeriodTransition {
    /// The period that is still open after this transition
    pub fn open_period(&self) -> Option<&ErrorPeriod> {
        match self {
            PeriodTransition::Opened(period) | PeriodTransition::Continued(period) => Some(period),
            PeriodTransition::Healthy | PeriodTransition::Closed(_) => None,
        }
    }
}

/// Everything the status page needs in one response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub statuses: HashMap<String, Status>,
    pub error_periods: HashMap<String, Vec<ErrorPeriod>>,
    pub histories: HashMap<String, Vec<CheckResult>>,
}

/// Uptime over the bounded history window for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointUptime {
    pub endpoint: String,

    /// Percentage in `0.0..=100.0`, `None` before the first check
    pub uptime_percentage: Option<f64>,
}
