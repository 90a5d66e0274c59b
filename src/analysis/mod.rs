//! Pure analysis passes applied to every fetch result
//!
//! Nothing in here performs I/O or touches engine state. The poll path feeds
//! each freshly fetched item set through all three passes and applies the
//! combined result to the target in a single state update:
//!
//! ```text
//! fetched items ─┬─> diff::detect        (canonical activities + new item count)
//!                ├─> words::summarize    (top terms, High/Medium/Low)
//!                └─> buckets::bucketize  (per-kind or per-day counters)
//! ```

pub mod buckets;
pub mod diff;
pub mod words;

pub use buckets::{ActivitySummary, DayBucket, bucketize, reference_today};
pub use diff::{DiffOutcome, detect};
pub use words::{WordCategory, WordFrequency, summarize};
