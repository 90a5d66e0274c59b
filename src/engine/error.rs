use uuid::Uuid;

use super::target::TargetId;
use crate::feed::FeedError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot monitor more than {max} targets at once")]
    CapacityExceeded { max: usize },

    #[error("{display_name} is already being monitored")]
    DuplicateTarget { display_name: String },

    #[error("unknown target {0}")]
    UnknownTarget(TargetId),

    #[error("target {0} is not active; restart it instead")]
    Inactive(TargetId),

    #[error("invalid target name '{0}'")]
    InvalidName(String),

    #[error("unknown session {0}")]
    UnknownSession(Uuid),

    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FeedError),

    #[error("session store failed: {0}")]
    PersistenceFailed(#[from] StorageError),
}

pub type EngineResult<T> = Result<T, EngineError>;
