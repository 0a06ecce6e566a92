//! Per-endpoint alert throttling
//!
//! ## Cooldown State Machine
//!
//! ```text
//! failure, never notified             → notify
//! failure, notified ≤ 5 min ago       → suppress
//! failure, notified  > 5 min ago      → notify
//! success                             → forget last notification
//! ```
//!
//! The notification instant is recorded by the caller only after the alert was delivered, so a
//! failed delivery is retried on the next unhealthy check. Every run of failures is its own
//! [`Outage`]; a delivery is only recorded against the outage it was dispatched for, so one that
//! finishes after the endpoint recovered (or after it failed again) never arms the cooldown.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

/// Minimum spacing between two alerts for the same endpoint
pub const NOTIFICATION_COOLDOWN_SECS: i64 = 5 * 60;

/// Identifies one contiguous run of failures of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outage(u64);

#[derive(Debug, Clone, Copy, Default)]
struct GateEntry {
    last_notified: Option<DateTime<Utc>>,

    /// `Some` while the endpoint is unhealthy
    outage: Option<Outage>,

    /// Outages seen so far, used to number the next one
    outages: u64,
}

/// Decides whether an alert should go out now
#[derive(Debug)]
pub struct NotifierGate {
    cooldown: TimeDelta,
    entries: Mutex<HashMap<String, GateEntry>>,
}

impl Default for NotifierGate {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifierGate {
    pub fn new() -> Self {
        Self::with_cooldown(TimeDelta::seconds(NOTIFICATION_COOLDOWN_SECS))
    }

    pub fn with_cooldown(cooldown: TimeDelta) -> Self {
        Self {
            cooldown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, GateEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cooled_down(&self, entry: Option<&GateEntry>, now: DateTime<Utc>) -> bool {
        match entry.and_then(|entry| entry.last_notified) {
            None => true,
            Some(last) => now - last > self.cooldown,
        }
    }

    /// True iff nothing was delivered yet for this endpoint, or the last delivery is older than
    /// the cooldown
    pub fn should_notify(&self, endpoint: &str, now: DateTime<Utc>) -> bool {
        self.cooled_down(self.entries().get(endpoint), now)
    }

    /// Feed the health of the latest check
    ///
    /// Returns the current outage when an alert should be dispatched for it.
    pub fn observe(&self, endpoint: &str, success: bool, now: DateTime<Utc>) -> Option<Outage> {
        if success {
            self.recover(endpoint);
            return None;
        }

        let mut entries = self.entries();
        let entry = entries.entry(endpoint.to_string()).or_default();
        let outage = match entry.outage {
            Some(outage) => outage,
            None => {
                entry.outages += 1;
                let outage = Outage(entry.outages);
                entry.outage = Some(outage);
                outage
            }
        };

        self.cooled_down(Some(entry), now).then_some(outage)
    }

    /// The endpoint is healthy again: forget its last notification
    pub fn recover(&self, endpoint: &str) {
        if let Some(entry) = self.entries().get_mut(endpoint) {
            if entry.last_notified.is_some() {
                trace!("{endpoint}: recovered, clearing notification cooldown");
            }
            entry.last_notified = None;
            entry.outage = None;
        }
    }

    /// Record a successful delivery for `outage` at `at`
    ///
    /// Ignored (returns `false`) unless `outage` is still the endpoint's current outage.
    pub fn record_delivery(&self, endpoint: &str, outage: Outage, at: DateTime<Utc>) -> bool {
        let mut entries = self.entries();
        match entries.get_mut(endpoint) {
            Some(entry) if entry.outage == Some(outage) => {
                entry.last_notified = Some(at);
                true
            }
            _ => false,
        }
    }

    pub fn last_notified(&self, endpoint: &str) -> Option<DateTime<Utc>> {
        self.entries()
            .get(endpoint)
            .and_then(|entry| entry.last_notified)
    }
}
