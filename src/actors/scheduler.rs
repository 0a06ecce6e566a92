//! SchedulerActor - Drives periodic sweeps over all endpoints
//!
//! ## State Machine
//!
//! ```text
//!            Start (immediate sweep, arm timer)
//!   Idle ───────────────────────────────────────▶ Running
//!    ▲                                               │
//!    └───────────────────── Stop ────────────────────┘
//!
//!   Start while Running → AlreadyRunning (no-op)
//!   Stop  while Idle    → NotRunning     (no-op)
//! ```
//!
//! ## Sweep
//!
//! ```text
//! tick → JoinSet ─┬─ probe(endpoint-1) → store.record → alerts.handle
//!                 ├─ probe(endpoint-2) → store.record → alerts.handle
//!                 └─ ...
//!        await all ──▶ SweepReport
//! ```
//!
//! The actor awaits the whole sweep before looking at its timer or commands again, so two
//! checks of the same endpoint are never in flight together and their records are applied in
//! initiation order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, instrument, warn};

use super::messages::{SchedulerCommand, SchedulerState, StartOutcome, StopOutcome, SweepReport};
use crate::alerts::AlertManager;
use crate::config::EndpointConfig;
use crate::monitors::probe::Prober;
use crate::storage::StateStore;

/// Default time between two sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Collaborators every sweep needs
#[derive(Clone)]
pub struct SweepContext {
    pub endpoints: Arc<Vec<EndpointConfig>>,
    pub prober: Arc<dyn Prober>,
    pub store: Arc<dyn StateStore>,
    pub alerts: Arc<AlertManager>,
}

/// Outcome of one endpoint's check within a sweep
struct EndpointOutcome {
    success: bool,
    dispatched: bool,
}

impl SweepContext {
    /// Check every endpoint concurrently and wait for all of them
    pub async fn sweep(&self) -> SweepReport {
        let mut tasks = JoinSet::new();

        for endpoint in self.endpoints.iter().cloned() {
            let prober = Arc::clone(&self.prober);
            let store = Arc::clone(&self.store);
            let alerts = Arc::clone(&self.alerts);

            tasks.spawn(async move {
                let result = prober.check(&endpoint).await;
                let transition = store.record(result.clone()).await;
                // delivery is detached, the handle is only used for accounting
                let dispatched = alerts.handle(&result, &transition).is_some();

                EndpointOutcome {
                    success: result.success,
                    dispatched,
                }
            });
        }

        let mut report = SweepReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    report.checked += 1;
                    if outcome.success {
                        report.healthy += 1;
                    } else {
                        report.unhealthy += 1;
                    }
                    if outcome.dispatched {
                        report.alerts_dispatched += 1;
                    }
                }
                Err(e) => {
                    error!("endpoint check task failed: {e}");
                }
            }
        }

        report
    }
}

/// Actor owning the recurring sweep timer
pub struct SchedulerActor {
    context: SweepContext,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    period: Duration,

    /// `Some` while running
    ticker: Option<Interval>,

    /// Whether the empty endpoint list has been reported already
    reported_empty: bool,
}

impl SchedulerActor {
    pub fn new(
        context: SweepContext,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        period: Duration,
    ) -> Self {
        Self {
            context,
            command_rx,
            period,
            ticker: None,
            reported_empty: false,
        }
    }

    /// Run the actor's main loop
    ///
    /// This runs until:
    /// - A Shutdown command is received
    /// - All handles are dropped
    #[instrument(skip(self), fields(endpoints = self.context.endpoints.len()))]
    pub async fn run(mut self) {
        debug!("starting scheduler actor");

        loop {
            tokio::select! {
                // Timer tick - only fires while running
                _ = next_tick(&mut self.ticker) => {
                    self.sweep().await;
                }

                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("all scheduler handles dropped, shutting down");
                        break;
                    };

                    match cmd {
                        SchedulerCommand::Start { respond_to } => {
                            let outcome = self.start().await;
                            let _ = respond_to.send(outcome);
                        }

                        SchedulerCommand::Stop { respond_to } => {
                            let _ = respond_to.send(self.stop());
                        }

                        SchedulerCommand::SweepNow { respond_to } => {
                            debug!("received SweepNow command");
                            let report = self.sweep().await;
                            let _ = respond_to.send(report);
                        }

                        SchedulerCommand::GetState { respond_to } => {
                            let _ = respond_to.send(self.state());
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }
            }
        }

        debug!("scheduler actor stopped");
    }

    fn state(&self) -> SchedulerState {
        if self.ticker.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    async fn start(&mut self) -> StartOutcome {
        if self.ticker.is_some() {
            debug!("start requested while already running");
            return StartOutcome::AlreadyRunning;
        }

        let report = self.sweep().await;

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);

        info!("monitoring started, sweeping every {}s", self.period.as_secs());
        StartOutcome::Started(report)
    }

    fn stop(&mut self) -> StopOutcome {
        match self.ticker.take() {
            Some(_) => {
                info!("monitoring stopped");
                StopOutcome::Stopped
            }
            None => {
                debug!("stop requested while idle");
                StopOutcome::NotRunning
            }
        }
    }

    #[instrument(skip(self))]
    async fn sweep(&mut self) -> SweepReport {
        if self.context.endpoints.is_empty() {
            if !self.reported_empty {
                warn!("no endpoints configured, sweeps are no-ops");
                self.reported_empty = true;
            }
            return SweepReport::default();
        }

        let started = Instant::now();
        let report = self.context.sweep().await;

        debug!(
            "sweep checked {} endpoints in {:.2}s ({} healthy, {} unhealthy, {} alerts)",
            report.checked,
            started.elapsed().as_secs_f64(),
            report.healthy,
            report.unhealthy,
            report.alerts_dispatched
        );

        report
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Handle for controlling a SchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor in the idle state
    pub fn spawn(context: SweepContext, period: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SchedulerActor::new(context, cmd_rx, period);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run an immediate sweep and arm the recurring timer
    pub async fn start(&self) -> Result<StartOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::Start { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Disarm the recurring timer
    pub async fn stop(&self) -> Result<StopOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::Stop { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Run one sweep now and wait for its report
    pub async fn sweep_now(&self) -> Result<SweepReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::SweepNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    pub async fn state(&self) -> Result<SchedulerState> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::GetState { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    /// Shut down the scheduler
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }
}
