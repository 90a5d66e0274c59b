//! Activity counters for the summary display

use chrono::{Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActivityItem, ActivityKind, TargetKind};

/// Number of calendar days (inclusive of today) covered for groups
pub const DAY_WINDOW: u64 = 3;

/// Posts of one calendar day in the reference timezone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivitySummary {
    /// Person targets: what the account produced
    ByKind { posts: usize, comments: usize },

    /// Group targets: posts over the last days, oldest first
    ByDay { days: Vec<DayBucket> },
}

impl ActivitySummary {
    /// Summary of a target with no activities yet, labelled in `offset`
    pub fn empty(kind: TargetKind, offset: FixedOffset) -> Self {
        bucketize(kind, &[], reference_today(offset), offset)
    }
}

/// Today's date in the reference timezone
pub fn reference_today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// Group `items` for display
///
/// `today` is the reference day; `offset` decides which calendar day an
/// item's `event_time` falls on.
pub fn bucketize(
    kind: TargetKind,
    items: &[ActivityItem],
    today: NaiveDate,
    offset: FixedOffset,
) -> ActivitySummary {
    match kind {
        TargetKind::Person => {
            let posts = items
                .iter()
                .filter(|item| item.kind == ActivityKind::Post)
                .count();
            ActivitySummary::ByKind {
                posts,
                comments: items.len() - posts,
            }
        }
        TargetKind::Group => {
            let mut days: Vec<DayBucket> = (0..DAY_WINDOW)
                .rev()
                .filter_map(|back| today.checked_sub_days(Days::new(back)))
                .map(|day| DayBucket {
                    day,
                    label: day.format("%b %d").to_string(),
                    count: 0,
                })
                .collect();

            for item in items.iter().filter(|item| item.kind == ActivityKind::Post) {
                let day = item.event_time.with_timezone(&offset).date_naive();
                if let Some(bucket) = days.iter_mut().find(|bucket| bucket.day == day) {
                    bucket.count += 1;
                }
            }

            ActivitySummary::ByDay { days }
        }
    }
}
