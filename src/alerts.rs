use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::clock::Clock;
use crate::config::{Alert, Webhook};
use crate::model::{CheckResult, ErrorPeriod, PeriodTransition};
use crate::monitors::cooldown::NotifierGate;
use crate::slack::SlackChannel;
use crate::util::format_elapsed;

/// Upper bound for one alert delivery
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(5);

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What gets reported about a failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPayload {
    pub endpoint: String,

    /// `None` when no response was received
    pub status_code: Option<u16>,

    pub message: String,

    /// When the failing check was initiated
    pub timestamp: DateTime<Utc>,

    /// Elapsed time of the ongoing error period
    pub ongoing_for: Option<Duration>,

    /// Raw error detail
    pub error: Option<String>,
}

impl AlertPayload {
    pub fn from_failure(
        result: &CheckResult,
        open_period: Option<&ErrorPeriod>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            endpoint: result.endpoint.clone(),
            status_code: Some(result.status_code).filter(|code| *code != 0),
            message: result.message.clone(),
            timestamp: result.timestamp,
            ongoing_for: open_period.map(|period| period.elapsed(now)),
            error: result.error.clone(),
        }
    }

    pub fn status_code_display(&self) -> String {
        self.status_code
            .map_or_else(|| "N/A".to_string(), |code| code.to_string())
    }

    pub fn ongoing_display(&self) -> Option<String> {
        self.ongoing_for.map(format_elapsed)
    }

    pub fn formatted_time(&self, offset: FixedOffset) -> String {
        self.timestamp
            .with_timezone(&offset)
            .format(TIME_FORMAT)
            .to_string()
    }
}

pub(crate) fn offset_or_utc(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| {
        warn!("invalid UTC offset of {minutes} minutes, using UTC");
        Utc.fix()
    })
}

/// Errors that can occur while delivering an alert
#[derive(Debug)]
pub enum AlertError {
    /// The request could not be sent or timed out
    Request(reqwest::Error),

    /// The channel answered with a non-success status
    Rejected { status: u16, body: String },
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertError::Request(err) => write!(f, "failed to send alert: {}", err),
            AlertError::Rejected { status, body } if body.is_empty() => {
                write!(f, "alert rejected with status {}", status)
            }
            AlertError::Rejected { status, body } => {
                write!(f, "alert rejected with status {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for AlertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AlertError::Request(err) => Some(err),
            AlertError::Rejected { .. } => None,
        }
    }
}

impl From<reqwest::Error> for AlertError {
    fn from(err: reqwest::Error) -> Self {
        AlertError::Request(err)
    }
}

/// Where alerts are delivered
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, alert: &AlertPayload) -> Result<(), AlertError>;
}

/// Generic JSON webhook
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(client: Client, webhook: &Webhook) -> Self {
        Self {
            client,
            url: webhook.url.clone(),
        }
    }

    pub fn build_payload(alert: &AlertPayload) -> serde_json::Value {
        let message = match alert.ongoing_display() {
            Some(duration) => format!(
                "🔴 **Endpoint DOWN**: `{}` ({}) for {}",
                alert.endpoint, alert.message, duration
            ),
            None => format!("🔴 **Endpoint DOWN**: `{}` ({})", alert.endpoint, alert.message),
        };

        json!({
            "message": message,
            "endpoint": alert.endpoint,
            "status_code": alert.status_code,
            "error": alert.error,
            "duration": alert.ongoing_display(),
            "timestamp": alert.timestamp.to_rfc3339(),
        })
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    #[instrument(skip(self, alert), fields(endpoint = %alert.endpoint))]
    async fn deliver(&self, alert: &AlertPayload) -> Result<(), AlertError> {
        let payload = Self::build_payload(alert);
        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        info!("Successfully sent webhook alert");
        Ok(())
    }
}

/// Build the configured alert channel, with the delivery timeout applied
pub fn channel_from_config(alert: &Alert) -> anyhow::Result<Arc<dyn AlertChannel>> {
    let client = Client::builder().timeout(ALERT_TIMEOUT).build()?;

    Ok(match alert {
        Alert::Slack(slack) => Arc::new(SlackChannel::new(client, slack)),
        Alert::Webhook(webhook) => Arc::new(WebhookChannel::new(client, webhook)),
    })
}

/// Routes check results through the notifier gate to the alert channel
pub struct AlertManager {
    gate: Arc<NotifierGate>,
    channel: Option<Arc<dyn AlertChannel>>,
    clock: Arc<dyn Clock>,
}

impl AlertManager {
    pub fn new(
        gate: Arc<NotifierGate>,
        channel: Option<Arc<dyn AlertChannel>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if channel.is_none() {
            warn!("no alert channel configured, alerts will not be delivered");
        }

        Self {
            gate,
            channel,
            clock,
        }
    }

    pub fn gate(&self) -> &Arc<NotifierGate> {
        &self.gate
    }

    /// Evaluate a freshly recorded result and dispatch an alert if the gate allows it
    ///
    /// Delivery runs on its own task; the returned handle may be dropped. `None` means no
    /// delivery was started.
    #[instrument(skip_all, fields(endpoint = %result.endpoint))]
    pub fn handle(
        &self,
        result: &CheckResult,
        transition: &PeriodTransition,
    ) -> Option<JoinHandle<()>> {
        let now = self.clock.now();

        let Some(outage) = self.gate.observe(&result.endpoint, result.success, now) else {
            trace!("no alert needed");
            return None;
        };

        let Some(channel) = self.channel.clone() else {
            trace!("alert suppressed, no channel configured");
            return None;
        };

        let payload = AlertPayload::from_failure(result, transition.open_period(), now);
        let gate = Arc::clone(&self.gate);
        debug!("dispatching alert via {}", channel.name());

        Some(tokio::spawn(async move {
            match channel.deliver(&payload).await {
                Ok(()) => {
                    if !gate.record_delivery(&payload.endpoint, outage, now) {
                        debug!(
                            "{}: outage ended before alert delivery completed",
                            payload.endpoint
                        );
                    }
                }
                Err(e) => {
                    error!("{}: alert delivery failed: {}", payload.endpoint, e);
                }
            }
        }))
    }
}
