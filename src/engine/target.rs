//! Monitored target state

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::archiver::SessionSnapshot;
use super::error::{EngineError, EngineResult};
use crate::analysis::{ActivitySummary, WordFrequency, bucketize};
use crate::{ActivityItem, Profile, TargetKind};

/// Opaque identifier of a registered target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TargetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TargetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Normalize an operator-supplied name into the bare feed name
///
/// Accepts `name`, `u/name`, `/u/name`, `user/name` for persons and
/// `name`, `r/name`, `/r/name` for groups. Only ASCII letters, digits, `_`
/// and `-` are allowed in the result.
pub fn normalize_name(kind: TargetKind, raw: &str) -> EngineResult<String> {
    let trimmed = raw.trim().trim_start_matches('/');

    let prefixes: &[&str] = match kind {
        TargetKind::Person => &["u/", "user/"],
        TargetKind::Group => &["r/"],
    };

    let bare = prefixes
        .iter()
        .find_map(|prefix| {
            trimmed
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &trimmed[prefix.len()..])
        })
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    let valid = !bare.is_empty()
        && bare
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid {
        return Err(EngineError::InvalidName(raw.to_string()));
    }

    Ok(bare.to_string())
}

/// Canonical display form, e.g. `u/name` or `r/name`
pub fn display_name(kind: TargetKind, name: &str) -> String {
    format!("{}{}", kind.prefix(), name)
}

/// One target and everything the engine knows about it
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringTarget {
    pub id: TargetId,

    /// Canonical name including the kind prefix
    pub display_name: String,

    /// Bare name passed to the feed
    pub name: String,

    pub kind: TargetKind,

    /// Last profile returned by the feed
    pub profile: Profile,

    /// Unique by id, newest first
    pub activities: Vec<ActivityItem>,

    pub word_summary: Vec<WordFrequency>,

    pub activity_summary: ActivitySummary,

    /// A poll task is scheduled for this target
    pub is_monitoring: bool,

    /// A fetch is in flight
    pub is_fetching: bool,

    /// Loaded from an archived session
    pub read_only: bool,

    pub last_fetch_time: Option<DateTime<Utc>>,

    pub last_error: Option<String>,

    /// Items first seen since monitoring (re)started
    pub new_activity_count: u64,

    pub started_at: DateTime<Utc>,

    /// Bumped on every start and stop; completions from older generations are dropped
    #[serde(skip)]
    pub(crate) generation: u64,

    /// Whether `activities` came from a successful fetch and can be diffed against
    #[serde(skip)]
    pub(crate) has_baseline: bool,
}

impl MonitoringTarget {
    /// A freshly registered target, pending its first fetch
    pub fn new(kind: TargetKind, name: String, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            id: TargetId::new(),
            display_name: display_name(kind, &name),
            profile: Profile::empty(kind, &name),
            name,
            kind,
            activities: Vec::new(),
            word_summary: Vec::new(),
            activity_summary: ActivitySummary::empty(kind, offset),
            is_monitoring: false,
            is_fetching: false,
            read_only: false,
            last_fetch_time: None,
            last_error: None,
            new_activity_count: 0,
            started_at: now,
            generation: 0,
            has_baseline: false,
        }
    }

    /// Rebuild a read-only target from an archived session
    pub fn from_snapshot(
        snapshot: SessionSnapshot,
        today: NaiveDate,
        offset: FixedOffset,
    ) -> Self {
        let activity_summary = bucketize(snapshot.kind, &snapshot.activities, today, offset);
        let name = snapshot
            .display_name
            .strip_prefix(snapshot.kind.prefix())
            .unwrap_or(&snapshot.display_name)
            .to_string();

        Self {
            id: TargetId::new(),
            display_name: snapshot.display_name,
            name,
            kind: snapshot.kind,
            profile: snapshot.profile,
            activities: snapshot.activities,
            word_summary: snapshot.word_summary,
            activity_summary,
            is_monitoring: false,
            is_fetching: false,
            read_only: true,
            last_fetch_time: Some(snapshot.stopped_at),
            last_error: None,
            new_activity_count: snapshot.new_activity_count,
            started_at: snapshot.started_at,
            generation: 0,
            has_baseline: false,
        }
    }

    /// Same kind and case-insensitively equal name
    pub fn same_target(&self, kind: TargetKind, name: &str) -> bool {
        self.kind == kind && self.name.eq_ignore_ascii_case(name)
    }

    /// Enter monitoring; activities are kept as history
    ///
    /// A target that has fetched before diffs its next fetch against that
    /// history, so items that appeared while it was stopped count as new.
    pub(crate) fn begin_session(&mut self, now: DateTime<Utc>) {
        self.is_monitoring = true;
        self.is_fetching = false;
        self.read_only = false;
        self.generation += 1;
        self.started_at = now;
        self.new_activity_count = 0;
        self.has_baseline = self.last_fetch_time.is_some();
        self.last_error = None;
    }

    /// Leave monitoring; any fetch still in flight belongs to an old generation
    pub(crate) fn end_session(&mut self) {
        self.is_monitoring = false;
        self.is_fetching = false;
        self.generation += 1;
    }
}
