//! Scheduler control endpoints

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::info;

use crate::actors::messages::{StartOutcome, StopOutcome};
use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{MonitoringResponse, SweepResponse},
};

/// POST /api/start-monitoring
///
/// Runs a sweep immediately and arms the timer. Succeeds when already running.
pub async fn start_monitoring(
    State(state): State<ApiState>,
) -> ApiResult<Json<MonitoringResponse>> {
    let response = match state.scheduler.start().await? {
        StartOutcome::Started(_) => MonitoringResponse::new(true, "monitoring started"),
        StartOutcome::AlreadyRunning => {
            MonitoringResponse::new(true, "monitoring is already running")
        }
    };

    Ok(Json(response))
}

/// DELETE /api/start-monitoring
pub async fn stop_monitoring(
    State(state): State<ApiState>,
) -> ApiResult<Json<MonitoringResponse>> {
    let response = match state.scheduler.stop().await? {
        StopOutcome::Stopped => MonitoringResponse::new(true, "monitoring stopped"),
        StopOutcome::NotRunning => MonitoringResponse::new(false, "monitoring is not running"),
    };

    Ok(Json(response))
}

/// GET /api/cron/health-check
///
/// Runs one sweep now, independent of the timer. Meant for an external cron trigger.
pub async fn run_health_check(State(state): State<ApiState>) -> ApiResult<Json<SweepResponse>> {
    let report = state.scheduler.sweep_now().await?;
    info!("on-demand sweep checked {} endpoints", report.checked);

    Ok(Json(SweepResponse {
        success: true,
        message: "health check performed".to_string(),
        timestamp: Utc::now(),
        report,
    }))
}
