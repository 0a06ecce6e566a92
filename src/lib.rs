pub mod actors;
pub mod alerts;
#[cfg(feature = "api")]
pub mod api;
pub mod clock;
pub mod config;
pub mod model;
pub mod monitor;
pub mod monitors;
pub mod query;
pub mod slack;
pub mod storage;
pub mod util;

pub use model::{CheckResult, EndpointUptime, ErrorPeriod, HealthSnapshot, PeriodTransition, Status};
pub use monitor::{Monitor, MonitorParts};
