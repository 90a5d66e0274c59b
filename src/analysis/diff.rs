//! New-item detection between two consecutive fetches of the same target

use std::collections::HashSet;

use tracing::trace;

use crate::ActivityItem;

/// Result of comparing a fetch against the stored activities
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    /// The new canonical activity list (unique ids, newest first)
    pub activities: Vec<ActivityItem>,

    /// Number of ids in `activities` that were absent from the previous set
    pub new_items: usize,
}

/// Compare `fetched` against the previously stored activities.
///
/// `previous == None` marks the initial fetch of a (re)started target: the
/// fetched set becomes the baseline and `new_items` is always 0.
///
/// Duplicate ids inside `fetched` are collapsed, keeping the first occurrence.
pub fn detect(previous: Option<&[ActivityItem]>, fetched: Vec<ActivityItem>) -> DiffOutcome {
    let mut seen = HashSet::with_capacity(fetched.len());
    let mut activities: Vec<ActivityItem> = fetched
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    // stable sort, so equal timestamps keep feed order
    activities.sort_by(|a, b| b.event_time.cmp(&a.event_time));

    let new_items = match previous {
        None => 0,
        Some(previous) => {
            let known: HashSet<&str> = previous.iter().map(|item| item.id.as_str()).collect();
            activities
                .iter()
                .filter(|item| !known.contains(item.id.as_str()))
                .count()
        }
    };

    trace!(
        "diff: {} activities, {} new (initial: {})",
        activities.len(),
        new_items,
        previous.is_none()
    );

    DiffOutcome {
        activities,
        new_items,
    }
}
