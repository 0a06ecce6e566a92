//! REST API for the status page
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **QuerySurface** for reads, **SchedulerHandle** for start/stop and on-demand sweeps
//!
//! ## Endpoints
//!
//! - `GET /api/health-status` - Statuses, error periods and histories
//! - `GET /api/endpoints` - Configured endpoints
//! - `GET /api/uptime` - Uptime per endpoint over the history window
//! - `POST /api/start-monitoring` - Start the scheduler
//! - `DELETE /api/start-monitoring` - Stop the scheduler
//! - `GET /api/cron/health-check` - Run one sweep now

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{EndpointsResponse, MonitoringResponse, SweepResponse, UptimeResponse};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;

/// Build the router with all routes
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    let app = Router::new()
        .route(
            "/api/health-status",
            get(routes::health_status::get_health_status),
        )
        .route("/api/endpoints", get(routes::endpoints::list_endpoints))
        .route("/api/uptime", get(routes::endpoints::get_uptime))
        .route(
            "/api/start-monitoring",
            post(routes::monitoring::start_monitoring).delete(routes::monitoring::stop_monitoring),
        )
        .route(
            "/api/cron/health-check",
            get(routes::monitoring::run_health_check),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.enable_cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
