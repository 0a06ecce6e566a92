//! State store trait definition
//!
//! This module defines the `StateStore` trait the scheduler writes to and the query surface
//! reads from. The in-memory implementation lives in [`super::memory`]; a persistent backend
//! can be swapped in behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{CheckResult, ErrorPeriod, HealthSnapshot, PeriodTransition, Status};

/// Process-wide health state, partitioned by endpoint
///
/// ## Concurrency
///
/// Implementations must accept concurrent `record` calls for *different* endpoints. Calls for
/// the *same* endpoint are serialized by the caller (the scheduler never runs two checks of one
/// endpoint at once), and must be applied in call order.
///
/// ## Failure
///
/// Recording and reading are infallible: the store does no I/O that can fail.
///
/// ## Snapshots
///
/// Read accessors return owned copies; mutating them never affects the store.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Record one check result
    ///
    /// Overwrites the endpoint's status, prepends to its history (capped), and applies the
    /// error-period transition. Returns what happened to the error periods.
    async fn record(&self, result: CheckResult) -> PeriodTransition;

    /// Latest status per endpoint
    async fn statuses(&self) -> HashMap<String, Status>;

    /// Error periods per endpoint, oldest first
    async fn error_periods(&self) -> HashMap<String, Vec<ErrorPeriod>>;

    /// Bounded history per endpoint, most recent first
    async fn histories(&self) -> HashMap<String, Vec<CheckResult>>;

    /// Uptime percentage over the history window, `None` if the endpoint has no history
    async fn uptime(&self, endpoint: &str) -> Option<f64>;

    /// All three mappings at once
    async fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            statuses: self.statuses().await,
            error_periods: self.error_periods().await,
            histories: self.histories().await,
        }
    }
}
