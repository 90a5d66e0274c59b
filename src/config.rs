use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use tracing::trace;

use crate::TargetKind;
use crate::engine::{DEFAULT_MAX_TARGETS, DEFAULT_POLL_INTERVAL, MonitorSettings};

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./sessions.db")
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Storage configuration (optional - defaults to SQLite)
    pub storage: Option<StorageConfig>,

    /// Control API (optional - not served when absent)
    pub api: Option<ApiSection>,

    /// Targets registered and started at launch
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct FeedConfig {
    #[serde(default = "crate::util::get_default_feed_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: crate::util::get_default_feed_url(),
            timeout: default_feed_timeout(),
        }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_feed_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct MonitoringConfig {
    /// Poll interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default = "default_max_targets")]
    pub max_targets: usize,

    /// Offset of the reference timezone used for day buckets
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            max_targets: default_max_targets(),
            utc_offset_minutes: 0,
        }
    }
}

impl MonitoringConfig {
    pub fn settings(&self) -> anyhow::Result<MonitorSettings> {
        if self.interval == 0 {
            anyhow::bail!("monitoring.interval must be at least one second");
        }

        let reference_offset = FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| {
                anyhow::anyhow!("invalid utc_offset_minutes: {}", self.utc_offset_minutes)
            })?;

        Ok(MonitorSettings {
            poll_interval: Duration::from_secs(self.interval),
            max_targets: self.max_targets,
            reference_offset,
        })
    }
}

fn default_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_max_targets() -> usize {
    DEFAULT_MAX_TARGETS
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Bearer token required on every request except health
    pub token: Option<String>,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub kind: TargetKind,
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
