//! REST control API for the monitoring engine
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Engine handle** as the only shared state
//! - **Bearer token** on everything except the health check
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check (includes session store health)
//! - `GET /api/v1/targets` - List targets
//! - `POST /api/v1/targets` - Register a target (`{"name", "kind", "start"}`)
//! - `GET /api/v1/targets/:id` - Target state
//! - `DELETE /api/v1/targets/:id` - Forget a target
//! - `POST /api/v1/targets/:id/{start,stop,restart,poll}` - Lifecycle
//! - `GET /api/v1/sessions` - Archived sessions
//! - `POST /api/v1/sessions/:id/load` - Load an archived session read-only

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod middleware;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{
    AddTargetRequest, HealthResponse, PollResponse, SessionsResponse, StopResponse,
    TargetCreated, TargetsResponse,
};

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post},
};
use std::net::{Ipv4Addr, SocketAddr};
#[cfg(feature = "api")]
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Optional authentication token
    pub auth_token: Option<String>,

    /// Enable CORS for dashboards served elsewhere
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            auth_token: None,
            enable_cors: true,
        }
    }
}

/// Build the router without binding it
#[cfg(feature = "api")]
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut protected = Router::new()
        .route(
            "/api/v1/targets",
            get(routes::targets::list_targets).post(routes::targets::add_target),
        )
        .route(
            "/api/v1/targets/:id",
            get(routes::targets::get_target).delete(routes::targets::remove_target),
        )
        .route(
            "/api/v1/targets/:id/start",
            post(routes::targets::start_target),
        )
        .route("/api/v1/targets/:id/stop", post(routes::targets::stop_target))
        .route(
            "/api/v1/targets/:id/restart",
            post(routes::targets::restart_target),
        )
        .route("/api/v1/targets/:id/poll", post(routes::targets::poll_target))
        .route("/api/v1/sessions", get(routes::sessions::list_sessions))
        .route(
            "/api/v1/sessions/:id/load",
            post(routes::sessions::load_session),
        );

    if let Some(token) = config.auth_token.clone() {
        protected = protected.route_layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

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
