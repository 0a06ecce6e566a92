use std::net::SocketAddr;
use std::time::Duration;

const HEALTH_CHECK_ENDPOINTS: &str = "HEALTH_CHECK_ENDPOINTS";

pub fn get_endpoints() -> Vec<String> {
    std::env::var(HEALTH_CHECK_ENDPOINTS)
        .map(|raw| parse_endpoint_list(&raw))
        .unwrap_or_default()
}

const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

pub fn get_slack_webhook() -> Option<String> {
    std::env::var(SLACK_WEBHOOK_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

const MONITOR_INTERVAL_SECS: &str = "MONITOR_INTERVAL_SECS";

const DEFAULT_INTERVAL_SECS: u64 = 60;

pub fn get_default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

pub fn get_interval() -> u64 {
    let interval_from_env = std::env::var(MONITOR_INTERVAL_SECS);
    interval_from_env.map_or(DEFAULT_INTERVAL_SECS, |res| {
        res.parse().unwrap_or(DEFAULT_INTERVAL_SECS)
    })
}

const MONITOR_API_ADDR: &str = "MONITOR_API_ADDR";

pub fn get_api_addr() -> Option<SocketAddr> {
    std::env::var(MONITOR_API_ADDR)
        .ok()
        .and_then(|addr| addr.parse().ok())
}

/// Parse an endpoint list given either as a JSON array of strings or as a comma-separated list
pub fn parse_endpoint_list(raw: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|endpoint| endpoint.trim().to_string())
            .filter(|endpoint| !endpoint.is_empty())
            .collect();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(String::from)
        .collect()
}

/// Render an elapsed time as `"{m}m {s}s"`, or `"{s}s"` below one minute
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let minutes = total / 60;
    let seconds = total % 60;

    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// (De)serialize a [`Duration`] as whole milliseconds
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
