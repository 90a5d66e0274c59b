//! In-memory session store (no persistence)
//!
//! Useful for:
//! - Testing without database dependencies
//! - Running the hub with `"backend": "none"`
//!
//! All sessions are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::backend::{HealthStatus, SessionStore};
use super::error::StorageResult;
use super::schema::SessionSummary;
use crate::engine::SessionSnapshot;

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    /// Sessions in save order
    sessions: RwLock<Vec<SessionSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> StorageResult<()> {
        debug!(
            "in-memory store: saving session {} for {}",
            snapshot.session_id, snapshot.display_name
        );

        let mut sessions = self.sessions.write().await;
        match sessions
            .iter_mut()
            .find(|stored| stored.session_id == snapshot.session_id)
        {
            Some(stored) => *stored = snapshot.clone(),
            None => sessions.push(snapshot.clone()),
        }

        Ok(())
    }

    async fn load_session(&self, session_id: Uuid) -> StorageResult<Option<SessionSnapshot>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .iter()
            .find(|stored| stored.session_id == session_id)
            .cloned())
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionSummary>> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> =
            sessions.iter().map(SessionSummary::from_snapshot).collect();
        summaries.sort_by(|a, b| b.stopped_at.cmp(&a.stopped_at));
        Ok(summaries)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory session store operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("sessions".to_string(), self.len().await.to_string()),
            ]),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory session store (no-op)");
        Ok(())
    }
}
