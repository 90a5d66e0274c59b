//! Activity feed collaborator
//!
//! The engine only depends on the [`ActivityFeedClient`] trait. Calls must be
//! free of side effects from the engine's point of view: the poll loop calls
//! `fetch` for the same target every interval and on manual refresh.
//!
//! ## Implementations
//!
//! - [`scraper::ScraperFeedClient`]: talks to the scraper service over HTTP

pub mod scraper;

use async_trait::async_trait;
use thiserror::Error;

use crate::{ActivityItem, Profile, TargetKind};

pub use scraper::ScraperFeedClient;

/// Everything a single fetch observed for a target
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<ActivityItem>,
    pub profile: Profile,
}

/// Errors of a single fetch
///
/// All of them are transient from the engine's point of view: the next tick
/// simply tries again.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("target {0} not found by the feed")]
    NotFound(String),

    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode feed response: {0}")]
    Decode(String),

    #[error("feed reported an error: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait ActivityFeedClient: Send + Sync {
    /// Fetch the current items and profile of a target
    ///
    /// `name` is the bare normalized name, without the `u/` or `r/` prefix.
    async fn fetch(&self, kind: TargetKind, name: &str) -> Result<FeedSnapshot, FeedError>;
}
