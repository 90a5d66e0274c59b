//! Stored session rows
//!
//! Sessions are stored with a handful of typed columns used for listing
//! and the full snapshot as a JSON payload:
//!
//! ```text
//! sessions(session_id PK, target_id, kind, display_name,
//!          started_at, stopped_at, new_activity_count, activity_count, payload)
//! ```
//!
//! Timestamps are Unix milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TargetKind;
use crate::engine::{SessionSnapshot, TargetId};

/// Listing view of a stored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub target_id: TargetId,
    pub kind: TargetKind,
    pub display_name: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub new_activity_count: u64,
    pub activity_count: usize,
}

impl SessionSummary {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            target_id: snapshot.target_id,
            kind: snapshot.kind,
            display_name: snapshot.display_name.clone(),
            started_at: snapshot.started_at,
            stopped_at: snapshot.stopped_at,
            new_activity_count: snapshot.new_activity_count,
            activity_count: snapshot.activities.len(),
        }
    }
}
