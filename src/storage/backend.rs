//! Session store trait definition
//!
//! This module defines the `SessionStore` trait that all persistence
//! backends implement. It is the engine's only view of durable storage.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StorageResult;
use super::schema::SessionSummary;
use crate::engine::SessionSnapshot;

/// Health status of the session store
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for session persistence backends
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the
/// engine and the API handlers.
///
/// ## Delivery
///
/// The engine calls `save_session` once per stop. Saving the same
/// `session_id` twice must not produce two sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist an archived monitoring session
    async fn save_session(&self, snapshot: &SessionSnapshot) -> StorageResult<()>;

    /// Load a full session by id
    async fn load_session(&self, session_id: Uuid) -> StorageResult<Option<SessionSnapshot>>;

    /// List stored sessions, most recently stopped first
    async fn list_sessions(&self) -> StorageResult<Vec<SessionSummary>>;

    /// Check backend health
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
