//! Message types for actor communication
//!
//! 1. **Commands**: Request/response messages sent to the scheduler via mpsc
//! 2. **Replies**: oneshot answers carrying the outcome of a command

use serde::Serialize;
use tokio::sync::oneshot;

/// Commands that can be sent to the SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run one sweep immediately, then arm the recurring timer
    ///
    /// A no-op when the timer is already armed.
    Start {
        respond_to: oneshot::Sender<StartOutcome>,
    },

    /// Disarm the recurring timer
    ///
    /// Sweeps already in flight complete normally.
    Stop {
        respond_to: oneshot::Sender<StopOutcome>,
    },

    /// Run one sweep now, whether or not the timer is armed
    ///
    /// Used for cron-style triggering and manual refresh.
    SweepNow {
        respond_to: oneshot::Sender<SweepReport>,
    },

    /// Report whether the timer is armed
    GetState {
        respond_to: oneshot::Sender<SchedulerState>,
    },

    /// Gracefully shut down the scheduler
    Shutdown,
}

/// Whether the recurring timer is armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The timer was armed; carries the report of the immediate sweep
    Started(SweepReport),

    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Summary of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Number of endpoints checked
    pub checked: usize,

    pub healthy: usize,

    pub unhealthy: usize,

    /// Alerts handed to the alert channel (delivery may still fail)
    pub alerts_dispatched: usize,
}
