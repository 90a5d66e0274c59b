//! Keyword summary of a fetch result
//!
//! ## Categories
//!
//! Terms are ranked by frequency and split into three contiguous rank bands:
//!
//! ```text
//! rank:     0 .. ceil(n/3)   | next ceil(n/3) | remainder
//! category: High             | Medium         | Low
//! ```
//!
//! With `n >= 3` every band holds at least one term. The only size where the
//! plain formula would leave `Low` empty is `n = 4`; there `Medium` gives up
//! its second slot.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{ActivityItem, Profile};

/// Number of terms kept in a summary
pub const TOP_TERMS: usize = 15;

/// Shortest token that is counted
pub const MIN_TERM_LENGTH: usize = 4;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid url pattern"));

static MARKDOWN_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link pattern"));

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}+").expect("valid word pattern"));

// only words of MIN_TERM_LENGTH or more matter here
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "about", "above", "after", "again", "against", "also", "although", "always", "among",
        "another", "anything", "around", "because", "been", "before", "being", "below",
        "between", "both", "cannot", "could", "does", "doing", "done", "down", "during", "each",
        "either", "else", "even", "ever", "every", "from", "further", "going", "gonna", "have",
        "having", "here", "hers", "herself", "himself", "into", "itself", "just", "know",
        "like", "made", "make", "many", "maybe", "might", "more", "most", "much", "must",
        "myself", "need", "never", "none", "only", "other", "ours", "ourselves", "over",
        "pretty", "really", "said", "same", "should", "since", "some", "something", "still",
        "such", "sure", "take", "than", "that", "thats", "their", "theirs", "them",
        "themselves", "then", "there", "these", "they", "thing", "things", "think", "this",
        "those", "though", "through", "until", "very", "want", "well", "were", "what",
        "whatever", "when", "where", "whether", "which", "while", "with", "within", "without",
        "would", "yeah", "your", "yours", "yourself", "yourselves", "deleted", "removed",
        "edit", "http", "https", "reddit", "comment", "comments", "post", "posts",
    ]
    .into_iter()
    .collect()
});

/// Rank band of a term in the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordCategory {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub term: String,
    pub frequency: usize,
    pub category: WordCategory,
}

/// Build the ranked keyword summary for one fetch result
///
/// Title, body and source group of every item are tokenized in item order,
/// followed by a group's description. That order also defines the
/// first-seen order used to break frequency ties.
pub fn summarize(items: &[ActivityItem], profile: &Profile) -> Vec<WordFrequency> {
    let description = match profile {
        Profile::Group { description, .. } => description.as_str(),
        Profile::Person { .. } => "",
    };
    let texts = items
        .iter()
        .flat_map(|item| {
            [
                item.title.as_str(),
                item.body.as_str(),
                item.source_group.as_str(),
            ]
        })
        .chain(std::iter::once(description));

    categorize(rank_terms(texts))
}

/// Count terms over `texts` and return the top terms, most frequent first
pub fn rank_terms<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    // (first seen position, count)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for text in texts {
        for term in tokenize(text) {
            let next_position = counts.len();
            counts.entry(term).or_insert((next_position, 0)).1 += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(term, (position, count))| (term, position, count))
        .collect();

    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));
    ranked.truncate(TOP_TERMS);

    ranked
        .into_iter()
        .map(|(term, _, count)| (term, count))
        .collect()
}

/// Case-folded alphabetic runs of at least [`MIN_TERM_LENGTH`] characters,
/// without links and stop words
pub fn tokenize(text: &str) -> Vec<String> {
    let without_urls = URL_PATTERN.replace_all(text, " ");
    let plain = MARKDOWN_LINK_PATTERN.replace_all(&without_urls, "$1");
    let lowered = plain.to_lowercase();

    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() >= MIN_TERM_LENGTH)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Assign rank bands to an already ranked term list
pub fn categorize(ranked: Vec<(String, usize)>) -> Vec<WordFrequency> {
    let n = ranked.len();
    let band = n.div_ceil(3);
    let high = band;
    let medium = if n >= 3 {
        band.min(n - high - 1)
    } else {
        band.min(n - high)
    };

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (term, frequency))| {
            let category = if rank < high {
                WordCategory::High
            } else if rank < high + medium {
                WordCategory::Medium
            } else {
                WordCategory::Low
            };

            WordFrequency {
                term,
                frequency,
                category,
            }
        })
        .collect()
}
