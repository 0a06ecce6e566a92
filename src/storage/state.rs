//! Per-endpoint health state and its transition function
//!
//! ## Error Period State Machine
//!
//! ```text
//! no open period + failure  → append {start: now, end: None}   (Opened)
//! open period    + failure  → nothing                           (Continued)
//! open period    + success  → set end = now                     (Closed)
//! no open period + success  → nothing                           (Healthy)
//! ```
//!
//! The only open period is always the last element, and periods are never removed.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::model::{CheckResult, ErrorPeriod, PeriodTransition, Status};

/// Maximum number of results kept per endpoint
pub const HISTORY_LIMIT: usize = 60;

/// Everything the store knows about a single endpoint
#[derive(Debug, Clone, Default)]
pub struct EndpointState {
    status: Option<Status>,

    /// Most recent first
    history: VecDeque<CheckResult>,

    error_periods: Vec<ErrorPeriod>,
}

impl EndpointState {
    /// Fold one result into the state, `now` being the instant it is recorded
    pub fn apply(&mut self, result: CheckResult, now: DateTime<Utc>) -> PeriodTransition {
        let success = result.success;

        self.history.push_front(result.clone());
        self.history.truncate(HISTORY_LIMIT);

        self.status = Some(Status {
            result,
            last_checked: now,
        });

        if success {
            match self.error_periods.last_mut() {
                Some(period) if period.is_open() => {
                    period.end_time = Some(now);
                    PeriodTransition::Closed(*period)
                }
                _ => PeriodTransition::Healthy,
            }
        } else {
            match self.error_periods.last() {
                Some(period) if period.is_open() => PeriodTransition::Continued(*period),
                _ => {
                    let period = ErrorPeriod::open(now);
                    self.error_periods.push(period);
                    PeriodTransition::Opened(period)
                }
            }
        }
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn history(&self) -> Vec<CheckResult> {
        self.history.iter().cloned().collect()
    }

    pub fn error_periods(&self) -> &[ErrorPeriod] {
        &self.error_periods
    }

    pub fn open_period(&self) -> Option<&ErrorPeriod> {
        self.error_periods.last().filter(|period| period.is_open())
    }

    /// Share of successful checks in the history window, as a percentage
    pub fn uptime(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }

        let successful = self.history.iter().filter(|result| result.success).count();
        Some(successful as f64 / self.history.len() as f64 * 100.0)
    }
}
