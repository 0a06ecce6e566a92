use std::collections::HashSet;
use std::net::SocketAddr;

use anyhow::Context;
use tracing::{trace, warn};

use crate::util;

/// How an endpoint is probed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// POST a trivial `{ __typename }` query and expect a GraphQL-shaped body
    #[default]
    Graphql,

    /// GET the URL and expect a 2xx/3xx response
    Http,
}

/// A probe target
///
/// In a config file this is either a bare URL string (probed as GraphQL) or an object.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "RawEndpoint")]
pub struct EndpointConfig {
    /// Probe URL, also the endpoint's identifier
    pub url: String,

    pub kind: ProbeKind,

    /// Regex the body must match for an HTTP probe to count as healthy
    pub body_pattern: Option<String>,
}

impl EndpointConfig {
    pub fn graphql(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ProbeKind::Graphql,
            body_pattern: None,
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ProbeKind::Http,
            body_pattern: None,
        }
    }

    pub fn with_body_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.body_pattern = Some(pattern.into());
        self
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawEndpoint {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        kind: ProbeKind,
        body_pattern: Option<String>,
    },
}

impl From<RawEndpoint> for EndpointConfig {
    fn from(raw: RawEndpoint) -> Self {
        match raw {
            RawEndpoint::Url(url) => EndpointConfig::graphql(url),
            RawEndpoint::Detailed {
                url,
                kind,
                body_pattern,
            } => EndpointConfig {
                url,
                kind,
                body_pattern,
            },
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    Slack(Slack),
    Webhook(Webhook),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Slack {
    pub url: String,

    /// Offset used when rendering alert timestamps
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

fn default_utc_offset_minutes() -> i32 {
    9 * 60
}

/// HTTP API settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Enable CORS for the status page
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Seconds between two sweeps
    #[serde(default = "crate::util::get_default_interval")]
    pub interval: u64,

    pub alert: Option<Alert>,

    pub api: Option<ApiConfig>,
}

impl Config {
    /// Build a configuration from `HEALTH_CHECK_ENDPOINTS`, `SLACK_WEBHOOK_URL`,
    /// `MONITOR_INTERVAL_SECS` and `MONITOR_API_ADDR`
    pub fn from_env() -> Self {
        let endpoints = util::get_endpoints()
            .into_iter()
            .map(EndpointConfig::graphql)
            .collect();

        let alert = util::get_slack_webhook().map(|url| {
            Alert::Slack(Slack {
                url,
                utc_offset_minutes: default_utc_offset_minutes(),
            })
        });

        let api = util::get_api_addr().map(|bind_addr| ApiConfig {
            bind_addr,
            ..ApiConfig::default()
        });

        Config {
            endpoints,
            interval: util::get_interval(),
            alert,
            api,
        }
        .normalized()
    }

    /// Drop duplicate endpoints (first occurrence wins) and clamp the interval to at least 1s
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.endpoints.retain(|endpoint| {
            let first = seen.insert(endpoint.url.clone());
            if !first {
                warn!("ignoring duplicate endpoint {}", endpoint.url);
            }
            first
        });

        if self.interval == 0 {
            warn!("interval of 0s is not allowed, using 1s");
            self.interval = 1;
        }

        self
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str::<Config>(&file_content)
        .context("Invalid configuration file provided!")
        .map(Config::normalized)
        .inspect(|config| trace!("loaded config: {config:?}"))
}
