//! Failure replies of the monitoring API
//!
//! Every failure is answered with an [`ErrorResponse`], the same `success`/`message` shape the
//! control endpoints use, so a status page can render either without branching on the route.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::warn;

use crate::api::types::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// The monitor was started without any endpoint to check
    NoEndpoints,

    /// The scheduler actor no longer answers commands
    SchedulerGone(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoEndpoints => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SchedulerGone(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NoEndpoints => {
                write!(f, "no endpoints configured (set HEALTH_CHECK_ENDPOINTS)")
            }
            ApiError::SchedulerGone(e) => write!(f, "scheduler is not available: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("request failed with {status}: {self}");

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
            timestamp: Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::SchedulerGone(err)
    }
}
