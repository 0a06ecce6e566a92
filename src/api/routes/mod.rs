pub mod endpoints;
pub mod health_status;
pub mod monitoring;
