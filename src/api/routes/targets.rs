//! Target endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{AddTargetRequest, PollResponse, StopResponse, TargetCreated, TargetsResponse},
};
use crate::engine::{MonitoringTarget, TargetId};

/// GET /api/v1/targets
///
/// Active targets first, then stopped and read-only ones
pub async fn list_targets(State(state): State<ApiState>) -> Json<TargetsResponse> {
    let targets = state.engine.list_targets().await;

    Json(TargetsResponse {
        count: targets.len(),
        max_targets: state.engine.settings().max_targets,
        targets,
    })
}

/// POST /api/v1/targets
pub async fn add_target(
    State(state): State<ApiState>,
    Json(request): Json<AddTargetRequest>,
) -> ApiResult<(StatusCode, Json<TargetCreated>)> {
    let id = state.engine.add_target(&request.name, request.kind).await?;

    if request.start {
        debug!("starting {id} right away");
        state.engine.start_monitoring(id).await?;
    }

    Ok((StatusCode::CREATED, Json(TargetCreated { id })))
}

/// GET /api/v1/targets/:id
pub async fn get_target(
    State(state): State<ApiState>,
    Path(id): Path<TargetId>,
) -> ApiResult<Json<MonitoringTarget>> {
    Ok(Json(state.engine.get_target(id).await?))
}

/// DELETE /api/v1/targets/:id
///
/// Idempotent; unknown ids also answer 204
pub async fn remove_target(State(state): State<ApiState>, Path(id): Path<TargetId>) -> StatusCode {
    state.engine.remove_target(id).await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/targets/:id/start
pub async fn start_target(
    State(state): State<ApiState>,
    Path(id): Path<TargetId>,
) -> ApiResult<Json<MonitoringTarget>> {
    state.engine.start_monitoring(id).await?;
    Ok(Json(state.engine.get_target(id).await?))
}

/// POST /api/v1/targets/:id/stop
pub async fn stop_target(
    State(state): State<ApiState>,
    Path(id): Path<TargetId>,
) -> ApiResult<Json<StopResponse>> {
    let session = state.engine.stop_monitoring(id).await?;
    Ok(Json(StopResponse { session }))
}

/// POST /api/v1/targets/:id/restart
pub async fn restart_target(
    State(state): State<ApiState>,
    Path(id): Path<TargetId>,
) -> ApiResult<Json<MonitoringTarget>> {
    state.engine.restart_monitoring(id).await?;
    Ok(Json(state.engine.get_target(id).await?))
}

/// POST /api/v1/targets/:id/poll
pub async fn poll_target(
    State(state): State<ApiState>,
    Path(id): Path<TargetId>,
) -> ApiResult<Json<PollResponse>> {
    let outcome = state.engine.poll_now(id).await?;
    Ok(Json(PollResponse {
        target_id: id,
        outcome,
    }))
}
