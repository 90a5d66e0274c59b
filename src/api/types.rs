//! Request and response bodies of the control API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TargetKind;
use crate::actors::TickOutcome;
use crate::engine::{MonitoringTarget, SessionSnapshot, TargetId};
use crate::storage::SessionSummary;

/// Body of POST /api/v1/targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTargetRequest {
    pub name: String,
    pub kind: TargetKind,

    /// Start monitoring right after registering
    #[serde(default)]
    pub start: bool,
}

/// Response for POST /api/v1/targets and POST /api/v1/sessions/:id/load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCreated {
    pub id: TargetId,
}

/// Response for GET /api/v1/targets
#[derive(Debug, Clone, Serialize)]
pub struct TargetsResponse {
    pub targets: Vec<MonitoringTarget>,
    pub count: usize,
    pub max_targets: usize,
}

/// Response for POST /api/v1/targets/:id/stop
#[derive(Debug, Clone, Serialize)]
pub struct StopResponse {
    /// `None` when the target was not being monitored
    pub session: Option<SessionSnapshot>,
}

/// Response for POST /api/v1/targets/:id/poll
#[derive(Debug, Clone, Serialize)]
pub struct PollResponse {
    pub target_id: TargetId,
    #[serde(flatten)]
    pub outcome: TickOutcome,
}

/// Response for GET /api/v1/sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub count: usize,
}

/// Response for GET /api/v1/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub store: StoreHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealth {
    pub healthy: bool,
    pub message: String,
}

/// Path parameter of session routes
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SessionPath {
    pub id: Uuid,
}
