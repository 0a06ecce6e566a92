//! Health status endpoint

use axum::{Json, extract::State};

use crate::api::state::ApiState;
use crate::model::HealthSnapshot;

/// GET /api/health-status
///
/// Returns the stored statuses, error periods and histories without probing anything
pub async fn get_health_status(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.query.snapshot().await)
}
