//! Session archiving
//!
//! Stopping a target freezes its state into a [`SessionSnapshot`], which
//! is what the session store persists and what read-only targets are
//! rebuilt from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::target::{MonitoringTarget, TargetId};
use crate::analysis::WordFrequency;
use crate::{ActivityItem, Profile, TargetKind};

/// Frozen state of one monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub target_id: TargetId,
    pub kind: TargetKind,
    pub display_name: String,
    pub profile: Profile,
    pub activities: Vec<ActivityItem>,
    pub word_summary: Vec<WordFrequency>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub new_activity_count: u64,
}

/// Freeze `target` as of `stopped_at`
pub fn archive(target: &MonitoringTarget, stopped_at: DateTime<Utc>) -> SessionSnapshot {
    SessionSnapshot {
        session_id: Uuid::new_v4(),
        target_id: target.id,
        kind: target.kind,
        display_name: target.display_name.clone(),
        profile: target.profile.clone(),
        activities: target.activities.clone(),
        word_summary: target.word_summary.clone(),
        started_at: target.started_at,
        stopped_at,
        new_activity_count: target.new_activity_count,
    }
}
