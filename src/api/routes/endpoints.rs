//! Endpoint listing and uptime

use axum::{Json, extract::State};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{EndpointsResponse, UptimeResponse},
};

/// GET /api/endpoints
///
/// Lists the configured endpoints in configuration order
pub async fn list_endpoints(State(state): State<ApiState>) -> ApiResult<Json<EndpointsResponse>> {
    let endpoints = state.query.endpoints();

    if endpoints.is_empty() {
        return Err(ApiError::NoEndpoints);
    }

    Ok(Json(EndpointsResponse { endpoints }))
}

/// GET /api/uptime
pub async fn get_uptime(State(state): State<ApiState>) -> Json<UptimeResponse> {
    Json(UptimeResponse {
        uptimes: state.query.uptimes().await,
    })
}
