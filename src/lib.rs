pub mod actors;
pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod feed;
pub mod storage;
pub mod util;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of external entity being monitored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A single account ("user" on the feed side)
    Person,
    /// A community ("subreddit" on the feed side)
    Group,
}

impl TargetKind {
    /// Prefix used for the canonical display name
    pub fn prefix(&self) -> &'static str {
        match self {
            TargetKind::Person => "u/",
            TargetKind::Group => "r/",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Person => "person",
            TargetKind::Group => "group",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "person" | "user" => Ok(TargetKind::Person),
            "group" | "community" => Ok(TargetKind::Group),
            other => Err(format!("unknown target kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Post,
    Comment,
}

/// A single observable item of a target's activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    /// Identifier, unique within one target
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub body: String,
    /// Community the item was posted in
    pub source_group: String,
    pub author: Option<String>,
    /// Authoritative key for sorting and bucketing
    pub event_time: DateTime<Utc>,
    pub url: String,
    pub score: i64,
    pub num_comments: u64,
}

/// Last-known descriptive metadata of a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Profile {
    Person {
        name: String,
        link_karma: i64,
        comment_karma: i64,
        created_at: Option<DateTime<Utc>>,
    },
    Group {
        name: String,
        subscribers: u64,
        active_users: u64,
        description: String,
        created_at: Option<DateTime<Utc>>,
    },
}

impl Profile {
    pub fn name(&self) -> &str {
        match self {
            Profile::Person { name, .. } | Profile::Group { name, .. } => name,
        }
    }

    /// Placeholder profile for a target that has not been fetched yet
    pub fn empty(kind: TargetKind, name: &str) -> Self {
        match kind {
            TargetKind::Person => Profile::Person {
                name: name.to_string(),
                link_karma: 0,
                comment_karma: 0,
                created_at: None,
            },
            TargetKind::Group => Profile::Group {
                name: name.to_string(),
                subscribers: 0,
                active_users: 0,
                description: String::new(),
                created_at: None,
            },
        }
    }
}
