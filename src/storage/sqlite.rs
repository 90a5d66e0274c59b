//! SQLite session store
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::backend::{HealthStatus, SessionStore};
use super::error::{StorageError, StorageResult};
use super::schema::SessionSummary;
use crate::engine::{SessionSnapshot, TargetId};

/// SQLite-backed session store
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `db_path` and run migrations
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite session store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("session store ready");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
    }

    fn parse_uuid(column: &str, value: &str) -> StorageResult<Uuid> {
        Uuid::parse_str(value).map_err(|e| {
            StorageError::SerializationError(format!("invalid {column} '{value}': {e}"))
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self, snapshot), fields(session = %snapshot.session_id))]
    async fn save_session(&self, snapshot: &SessionSnapshot) -> StorageResult<()> {
        let payload = serde_json::to_string(snapshot)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id, target_id, kind, display_name,
                started_at, stopped_at, new_activity_count, activity_count, payload
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (session_id) DO UPDATE SET
                stopped_at = excluded.stopped_at,
                new_activity_count = excluded.new_activity_count,
                activity_count = excluded.activity_count,
                payload = excluded.payload
            "#,
        )
        .bind(snapshot.session_id.to_string())
        .bind(snapshot.target_id.to_string())
        .bind(snapshot.kind.as_str())
        .bind(&snapshot.display_name)
        .bind(Self::timestamp_to_millis(&snapshot.started_at))
        .bind(Self::timestamp_to_millis(&snapshot.stopped_at))
        .bind(snapshot.new_activity_count as i64)
        .bind(snapshot.activities.len() as i64)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        debug!("saved session for {}", snapshot.display_name);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_session(&self, session_id: Uuid) -> StorageResult<Option<SessionSnapshot>> {
        let row = sqlx::query("SELECT payload FROM sessions WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let payload: String = row.get("payload");
            serde_json::from_str(&payload).map_err(StorageError::from)
        })
        .transpose()
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self) -> StorageResult<Vec<SessionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, target_id, kind, display_name,
                   started_at, stopped_at, new_activity_count, activity_count
            FROM sessions
            ORDER BY stopped_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let sessions = rows
            .into_iter()
            .map(|row| {
                let session_id: String = row.get("session_id");
                let target_id: String = row.get("target_id");
                let kind: String = row.get("kind");

                Ok(SessionSummary {
                    session_id: Self::parse_uuid("session_id", &session_id)?,
                    target_id: TargetId::from(Self::parse_uuid("target_id", &target_id)?),
                    kind: kind
                        .parse()
                        .map_err(StorageError::SerializationError)?,
                    display_name: row.get("display_name"),
                    started_at: Self::millis_to_timestamp(row.get("started_at")),
                    stopped_at: Self::millis_to_timestamp(row.get("stopped_at")),
                    new_activity_count: row.get::<i64, _>("new_activity_count") as u64,
                    activity_count: row.get::<i64, _>("activity_count") as usize,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        debug!("listed {} sessions", sessions.len());
        Ok(sessions)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(HealthStatus {
                healthy: true,
                message: "SQLite session store operational".to_string(),
                metadata: HashMap::from([
                    ("backend".to_string(), "sqlite".to_string()),
                    ("db_path".to_string(), self.db_path.clone()),
                ]),
            }),
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite session store");
        self.pool.close().await;
        Ok(())
    }
}
