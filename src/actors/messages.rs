//! Message types for actor communication
//!
//! 1. **Commands**: sent to a single poller via its mpsc channel
//! 2. **Events**: broadcast by the engine to any number of subscribers

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::engine::TargetId;

/// Result of one poll tick for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// The fetch result was applied to the target
    Applied { new_items: usize },

    /// No fetch was made: the target is not monitoring or a fetch is already in flight
    Skipped,

    /// The fetch completed after the target was stopped or removed
    Discarded,

    /// The feed returned an error; the target keeps its previous state
    Failed { error: String },
}

/// Engine notifications
///
/// Published on a broadcast channel; slow subscribers may lag and miss
/// events, which is fine since the registry always holds the current state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    MonitoringStarted {
        target_id: TargetId,
        display_name: String,
    },

    /// A fetch was applied to the target
    TargetUpdated {
        target_id: TargetId,
        display_name: String,
        new_items: usize,
        total_items: usize,
        timestamp: DateTime<Utc>,
    },

    FetchFailed {
        target_id: TargetId,
        display_name: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    StaleFetchDiscarded {
        target_id: TargetId,
    },

    MonitoringStopped {
        target_id: TargetId,
        display_name: String,
    },

    SessionArchived {
        target_id: TargetId,
        session_id: Uuid,
        display_name: String,
    },
}

impl MonitorEvent {
    pub fn target_id(&self) -> TargetId {
        match self {
            MonitorEvent::MonitoringStarted { target_id, .. }
            | MonitorEvent::TargetUpdated { target_id, .. }
            | MonitorEvent::FetchFailed { target_id, .. }
            | MonitorEvent::StaleFetchDiscarded { target_id }
            | MonitorEvent::MonitoringStopped { target_id, .. }
            | MonitorEvent::SessionArchived { target_id, .. } => *target_id,
        }
    }
}

/// Commands that can be sent to a PollerActor
#[derive(Debug)]
pub enum PollerCommand {
    /// Run a tick right away, bypassing the interval timer
    PollNow {
        respond_to: oneshot::Sender<TickOutcome>,
    },

    /// Stop ticking and exit
    ///
    /// A fetch already in flight keeps running; the engine discards its result.
    Shutdown,
}
