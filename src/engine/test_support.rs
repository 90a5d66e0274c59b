//! Fixtures shared by unit tests

use chrono::{DateTime, Duration, Offset, Utc};

use super::archiver::{SessionSnapshot, archive};
use super::target::MonitoringTarget;
use crate::analysis::summarize;
use crate::{ActivityItem, ActivityKind, TargetKind};

pub fn item(id: &str, event_time: DateTime<Utc>) -> ActivityItem {
    ActivityItem {
        id: id.to_string(),
        kind: ActivityKind::Post,
        title: format!("Thoughts about ownership and borrowing {id}"),
        body: "Lifetimes finally clicked after reading the compiler errors".to_string(),
        source_group: "rust".to_string(),
        author: Some("someone".to_string()),
        event_time,
        url: format!("https://example.com/{id}"),
        score: 1,
        num_comments: 0,
    }
}

pub fn target_with(kind: TargetKind, name: &str, activities: Vec<ActivityItem>) -> MonitoringTarget {
    let now = Utc::now();
    let mut target = MonitoringTarget::new(kind, name.to_string(), now, Utc.fix());
    target.word_summary = summarize(&activities, &target.profile);
    target.activities = activities;
    target
}

/// An archived session for `display_name` (e.g. `u/someone` or `r/rust`)
pub fn snapshot(display_name: &str) -> SessionSnapshot {
    let (kind, name) = match display_name.split_once('/') {
        Some(("r", name)) => (TargetKind::Group, name),
        Some((_, name)) => (TargetKind::Person, name),
        None => (TargetKind::Person, display_name),
    };

    let now = Utc::now();
    let target = target_with(
        kind,
        name,
        vec![item("t3_b", now - Duration::minutes(5)), item("t3_a", now - Duration::hours(3))],
    );

    archive(&target, now)
}
