//! Archived session endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{SessionPath, SessionsResponse, TargetCreated},
};

/// GET /api/v1/sessions
///
/// Stored sessions, most recently stopped first
pub async fn list_sessions(State(state): State<ApiState>) -> ApiResult<Json<SessionsResponse>> {
    let sessions = state.engine.store().list_sessions().await?;

    Ok(Json(SessionsResponse {
        count: sessions.len(),
        sessions,
    }))
}

/// POST /api/v1/sessions/:id/load
///
/// Loads the session as a read-only target
pub async fn load_session(
    State(state): State<ApiState>,
    Path(SessionPath { id }): Path<SessionPath>,
) -> ApiResult<(StatusCode, Json<TargetCreated>)> {
    let target_id = state.engine.load_session(id).await?;
    Ok((StatusCode::CREATED, Json(TargetCreated { id: target_id })))
}
