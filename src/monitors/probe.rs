//! Single-endpoint health probes
//!
//! A probe never fails: every transport or protocol problem is folded into a [`CheckResult`]
//! with `success == false` and a classified message.
//!
//! ## Health Rules
//!
//! ```text
//! GraphQL:  POST {"query":"{ __typename }"}
//!           healthy ⇔ status in 200..400 AND body has top-level `data` or `errors`
//! HTTP:     GET
//!           healthy ⇔ status in 200..400 AND body matches `body_pattern` (if configured)
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{error, instrument, trace, warn};

use crate::clock::Clock;
use crate::config::{EndpointConfig, ProbeKind};
use crate::model::CheckResult;

/// Upper bound for one check, connection included
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Query sent to GraphQL endpoints; every schema answers it
const LIVENESS_QUERY: &str = "{ __typename }";

/// Executes one health check against one endpoint
#[async_trait]
pub trait Prober: Send + Sync {
    async fn check(&self, endpoint: &EndpointConfig) -> CheckResult;
}

/// Why a request never produced a usable response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    ConnectionRefused,
    Dns,
    Connect,
    InvalidUrl,
    Body,
    Other,
}

impl TransportFailure {
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportFailure::Timeout;
        }

        if err.is_builder() {
            return TransportFailure::InvalidUrl;
        }

        if err.is_connect() {
            let mut source = err.source();
            while let Some(cause) = source {
                if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                    match io.kind() {
                        std::io::ErrorKind::ConnectionRefused => {
                            return TransportFailure::ConnectionRefused;
                        }
                        std::io::ErrorKind::TimedOut => return TransportFailure::Timeout,
                        _ => {}
                    }
                }

                let text = cause.to_string().to_lowercase();
                if text.contains("dns error") || text.contains("failed to lookup address") {
                    return TransportFailure::Dns;
                }
                if text.contains("connection refused") {
                    return TransportFailure::ConnectionRefused;
                }

                source = cause.source();
            }
            return TransportFailure::Connect;
        }

        if err.is_body() || err.is_decode() {
            return TransportFailure::Body;
        }

        TransportFailure::Other
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Timeout => write!(f, "server response timed out"),
            TransportFailure::ConnectionRefused => {
                write!(f, "could not connect to server (connection refused)")
            }
            TransportFailure::Dns => write!(f, "server could not be found (DNS error)"),
            TransportFailure::Connect => write!(f, "could not connect to server"),
            TransportFailure::InvalidUrl => write!(f, "invalid endpoint URL"),
            TransportFailure::Body => write!(f, "failed to read response body"),
            TransportFailure::Other => write!(f, "unknown error occurred"),
        }
    }
}

/// Longest response body excerpt kept in [`CheckResult::error`]
const ERROR_BODY_EXCERPT: usize = 200;

/// Render an error with its whole cause chain, outermost first
///
/// Causes already spelled out by the layer above are skipped.
pub fn describe_error(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// Error detail for a response the server itself flagged as failed
pub fn server_error_detail(status_code: u16, body: &str) -> Option<String> {
    if status_code < 500 {
        return None;
    }

    let body = body.trim();
    if body.is_empty() {
        return Some(format!("status {status_code}"));
    }

    let mut excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
    if excerpt.len() < body.len() {
        excerpt.push('…');
    }
    Some(format!("status {status_code}: {excerpt}"))
}

/// Judgement on a response that did arrive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub healthy: bool,
    pub status_code: u16,
    pub message: String,
}

fn is_success_status(status_code: u16) -> bool {
    (200..400).contains(&status_code)
}

fn top_level_field<'a>(body: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    body.and_then(|value| value.get(name))
        .filter(|value| !value.is_null())
}

/// Evaluate a GraphQL response
pub fn evaluate_graphql(status_code: u16, body: &str) -> Verdict {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let field = |name| top_level_field(parsed.as_ref(), name);
    let well_formed = field("data").is_some() || field("errors").is_some();

    if is_success_status(status_code) && well_formed {
        return Verdict {
            healthy: true,
            status_code,
            message: "GraphQL server responded normally".to_string(),
        };
    }

    let first_error = field("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str);

    let message = match first_error {
        Some(detail) if status_code >= 400 => {
            format!("GraphQL error: {detail} (status {status_code})")
        }
        _ if is_success_status(status_code) => {
            format!("malformed GraphQL response (status {status_code})")
        }
        _ => format!("server returned status {status_code}"),
    };

    Verdict {
        healthy: false,
        status_code,
        message,
    }
}

/// Evaluate a plain HTTP response
pub fn evaluate_http(status_code: u16, body: &str, body_pattern: Option<&str>) -> Verdict {
    if !is_success_status(status_code) {
        return Verdict {
            healthy: false,
            status_code,
            message: format!("server returned status {status_code}"),
        };
    }

    if let Some(pattern) = body_pattern {
        match regex::Regex::new(pattern) {
            Ok(re) if !re.is_match(body) => {
                return Verdict {
                    healthy: false,
                    status_code,
                    message: format!("response body does not match '{pattern}'"),
                };
            }
            Ok(_) => {}
            Err(e) => {
                error!("invalid regex pattern '{}': {}", pattern, e);
                return Verdict {
                    healthy: false,
                    status_code,
                    message: format!("invalid body pattern '{pattern}'"),
                };
            }
        }
    }

    Verdict {
        healthy: true,
        status_code,
        message: "server responded normally".to_string(),
    }
}

/// Prober backed by a shared `reqwest` client
pub struct HttpProber {
    /// HTTP client (reused across requests for efficiency)
    client: reqwest::Client,

    clock: Arc<dyn Clock>,
}

impl HttpProber {
    pub fn new(clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Self::with_timeout(clock, PROBE_TIMEOUT)
    }

    pub fn with_timeout(clock: Arc<dyn Clock>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, clock })
    }

    /// Returns (status_code, body)
    async fn execute_request(&self, endpoint: &EndpointConfig) -> reqwest::Result<(u16, String)> {
        let request = match endpoint.kind {
            ProbeKind::Graphql => self
                .client
                .post(&endpoint.url)
                .json(&json!({ "query": LIVENESS_QUERY })),
            ProbeKind::Http => self.client.get(&endpoint.url),
        };

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let body = response.text().await?;

        Ok((status_code, body))
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip(self), fields(endpoint = %endpoint.url))]
    async fn check(&self, endpoint: &EndpointConfig) -> CheckResult {
        trace!("checking endpoint");

        let timestamp = self.clock.now();
        let start = Instant::now();
        let outcome = self.execute_request(endpoint).await;
        let response_time = start.elapsed();

        match outcome {
            Ok((status_code, body)) => {
                let verdict = match endpoint.kind {
                    ProbeKind::Graphql => evaluate_graphql(status_code, &body),
                    ProbeKind::Http => {
                        evaluate_http(status_code, &body, endpoint.body_pattern.as_deref())
                    }
                };

                if !verdict.healthy {
                    warn!("endpoint unhealthy: {}", verdict.message);
                }
                let error = server_error_detail(status_code, &body);

                CheckResult {
                    endpoint: endpoint.url.clone(),
                    success: verdict.healthy,
                    status_code: verdict.status_code,
                    message: verdict.message,
                    timestamp,
                    response_time,
                    error,
                }
            }
            Err(e) => {
                let failure = TransportFailure::classify(&e);
                let detail = describe_error(&e);
                warn!("endpoint check failed ({failure}): {detail}");

                CheckResult {
                    endpoint: endpoint.url.clone(),
                    success: false,
                    status_code: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    message: failure.to_string(),
                    timestamp,
                    response_time,
                    error: Some(detail),
                }
            }
        }
    }
}
