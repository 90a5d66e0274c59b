//! Health check endpoint

use axum::{Json, extract::State};
use tracing::warn;

use crate::api::{
    state::ApiState,
    types::{HealthResponse, StoreHealth},
};

/// GET /api/v1/health
///
/// Always answers; `status` is "degraded" while the session store is unhealthy
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let store = match state.engine.store().health_check().await {
        Ok(health) => StoreHealth {
            healthy: health.healthy,
            message: health.message,
        },
        Err(e) => {
            warn!("session store health check failed: {}", e);
            StoreHealth {
                healthy: false,
                message: e.to_string(),
            }
        }
    };

    Json(HealthResponse {
        status: if store.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        store,
    })
}
