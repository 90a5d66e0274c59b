//! HTTP client for the scraper service
//!
//! The scraper exposes a single `POST /scrape` endpoint that takes the kind of
//! lookup and a name, and answers with the profile plus the recent items:
//!
//! ```text
//! {"type": "user", "username": "..."}       -> {"user": {..}, "posts": [..], "comments": [..]}
//! {"type": "community", "subreddit": "..."} -> {"subreddit": {..}, "posts": [..]}
//! ```
//!
//! Failures come back as `{"error": "not_found" | "parse_error" | .., "message": ".."}`
//! with a 404 or 500 status.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, trace};

use super::{ActivityFeedClient, FeedError, FeedSnapshot};
use crate::{ActivityItem, ActivityKind, Profile, TargetKind};

/// Feed client backed by the scraper service
#[derive(Debug, Clone)]
pub struct ScraperFeedClient {
    /// HTTP client (reused across requests)
    client: reqwest::Client,

    /// Base URL without trailing slash, e.g. `http://127.0.0.1:5001`
    base_url: String,
}

impl ScraperFeedClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the scraper service is up
    pub async fn health(&self) -> Result<(), FeedError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Status {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            });
        }

        Ok(())
    }

    async fn scrape(&self, kind: TargetKind, name: &str) -> Result<serde_json::Value, FeedError> {
        let request = match kind {
            TargetKind::Person => json!({ "type": "user", "username": name }),
            TargetKind::Group => json!({ "type": "community", "subreddit": name }),
        };

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(format!("{}{name}", kind.prefix())));
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|error| error.describe())
                .unwrap_or(body);
            return Err(FeedError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| FeedError::Decode(e.to_string()))?;

        if value.get("error").is_some() {
            let error: ErrorBody =
                serde_json::from_value(value).map_err(|e| FeedError::Decode(e.to_string()))?;
            return Err(FeedError::Upstream(error.describe()));
        }

        Ok(value)
    }
}

#[async_trait]
impl ActivityFeedClient for ScraperFeedClient {
    #[instrument(skip(self))]
    async fn fetch(&self, kind: TargetKind, name: &str) -> Result<FeedSnapshot, FeedError> {
        trace!("requesting {kind} {name} from {}", self.base_url);

        let value = self.scrape(kind, name).await?;

        let snapshot = match kind {
            TargetKind::Person => {
                let response: UserResponse =
                    serde_json::from_value(value).map_err(|e| FeedError::Decode(e.to_string()))?;
                response.into_snapshot()
            }
            TargetKind::Group => {
                let response: CommunityResponse =
                    serde_json::from_value(value).map_err(|e| FeedError::Decode(e.to_string()))?;
                response.into_snapshot()
            }
        };

        trace!("received {} items for {name}", snapshot.items.len());

        Ok(snapshot)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn describe(self) -> String {
        match self.message {
            Some(message) => format!("{}: {}", self.error, message),
            None => self.error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: UserProfile,
    #[serde(default)]
    posts: Vec<PostRecord>,
    #[serde(default)]
    comments: Vec<CommentRecord>,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    name: String,
    #[serde(default)]
    link_karma: i64,
    #[serde(default)]
    comment_karma: i64,
    created_utc: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CommunityResponse {
    subreddit: CommunityProfile,
    #[serde(default)]
    posts: Vec<PostRecord>,
}

#[derive(Debug, Deserialize)]
struct CommunityProfile {
    display_name: String,
    #[serde(default)]
    subscribers: u64,
    #[serde(default)]
    accounts_active: u64,
    #[serde(default)]
    public_description: String,
    created_utc: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PostRecord {
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    permalink: String,
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentRecord {
    id: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    link_title: String,
    #[serde(default)]
    permalink: String,
}

fn timestamp(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs as i64, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Explicit id, then permalink, then a key derived from the content
fn item_id(id: Option<String>, permalink: &str, kind: ActivityKind, created: f64, text: &str) -> String {
    match id {
        Some(id) if !id.is_empty() => id,
        _ if !permalink.is_empty() => permalink.to_string(),
        _ => format!("{kind:?}:{}:{text}", created as i64).to_lowercase(),
    }
}

impl PostRecord {
    fn into_item(self) -> ActivityItem {
        let id = item_id(
            self.id,
            &self.permalink,
            ActivityKind::Post,
            self.created_utc,
            &self.title,
        );

        ActivityItem {
            id,
            kind: ActivityKind::Post,
            title: self.title,
            body: self.selftext,
            source_group: self.subreddit,
            author: self.author.filter(|author| !author.is_empty()),
            event_time: timestamp(self.created_utc),
            url: if self.url.is_empty() {
                self.permalink
            } else {
                self.url
            },
            score: self.score,
            num_comments: self.num_comments,
        }
    }
}

impl CommentRecord {
    fn into_item(self, author: &str) -> ActivityItem {
        let id = item_id(
            self.id,
            &self.permalink,
            ActivityKind::Comment,
            self.created_utc,
            &self.body,
        );

        ActivityItem {
            id,
            kind: ActivityKind::Comment,
            title: self.link_title,
            body: self.body,
            source_group: self.subreddit,
            author: Some(author.to_string()),
            event_time: timestamp(self.created_utc),
            url: self.permalink,
            score: self.score,
            num_comments: 0,
        }
    }
}

impl UserResponse {
    fn into_snapshot(self) -> FeedSnapshot {
        let name = self.user.name;

        let mut items: Vec<ActivityItem> =
            self.posts.into_iter().map(PostRecord::into_item).collect();
        items.extend(self.comments.into_iter().map(|c| c.into_item(&name)));

        FeedSnapshot {
            items,
            profile: Profile::Person {
                name,
                link_karma: self.user.link_karma,
                comment_karma: self.user.comment_karma,
                created_at: self.user.created_utc.map(timestamp),
            },
        }
    }
}

impl CommunityResponse {
    fn into_snapshot(self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.posts.into_iter().map(PostRecord::into_item).collect(),
            profile: Profile::Group {
                name: self.subreddit.display_name,
                subscribers: self.subreddit.subscribers,
                active_users: self.subreddit.accounts_active,
                description: self.subreddit.public_description,
                created_at: self.subreddit.created_utc.map(timestamp),
            },
        }
    }
}
