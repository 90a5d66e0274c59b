//! Session persistence
//!
//! When monitoring of a target stops, the engine hands exactly one
//! [`SessionSnapshot`](crate::engine::SessionSnapshot) to a [`SessionStore`].
//! Stored sessions can later be listed and loaded back into the engine as
//! read-only targets.
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database with migrations
//! - **In-Memory**: no persistence, for tests or `"backend": "none"`
//!
//! ## Usage
//!
//! ```no_run
//! use feedwatch::storage::{SessionStore, sqlite::SqliteSessionStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteSessionStore::new("./sessions.db").await?;
//!     println!("{} sessions stored", store.list_sessions().await?.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, SessionStore};
pub use error::{StorageError, StorageResult};
pub use memory::MemorySessionStore;
pub use schema::SessionSummary;
