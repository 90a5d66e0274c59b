//! Fakes and builders shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwatch::{
    ActivityItem, ActivityKind, Profile, TargetKind,
    engine::{Engine, EngineContext, MonitorSettings, SessionSnapshot},
    feed::{ActivityFeedClient, FeedError, FeedSnapshot},
    storage::{
        HealthStatus, MemorySessionStore, SessionStore, SessionSummary, StorageError,
        StorageResult,
    },
};
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

pub const TEST_INTERVAL: Duration = Duration::from_secs(15);

/// One scripted feed answer
#[derive(Debug, Clone)]
pub enum Step {
    Items(Vec<ActivityItem>),
    Fail(String),
}

/// Feed answering from a script; the last step repeats forever
///
/// A gated feed holds every fetch until the test releases it, which makes
/// "fetch in flight" a state tests can observe and control.
pub struct ScriptedFeed {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    entered: Notify,
    gate: Option<Semaphore>,
}

impl ScriptedFeed {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            gate: None,
        })
    }

    pub fn gated(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            gate: Some(Semaphore::new(0)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until a fetch has entered the feed
    pub async fn wait_for_fetch(&self) {
        self.entered.notified().await;
    }

    /// Let `n` held fetches complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap_or(Step::Items(Vec::new()))
        }
    }
}

#[async_trait]
impl ActivityFeedClient for ScriptedFeed {
    async fn fetch(&self, kind: TargetKind, name: &str) -> Result<FeedSnapshot, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.next_step();
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        match step {
            Step::Items(items) => Ok(FeedSnapshot {
                items,
                profile: Profile::empty(kind, name),
            }),
            Step::Fail(message) => Err(FeedError::Upstream(message)),
        }
    }
}

/// Memory store that counts saves and can be told to fail them
#[derive(Default)]
pub struct RecordingStore {
    inner: MemorySessionStore,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let store = Self::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> StorageResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("disk full".to_string()));
        }
        self.inner.save_session(snapshot).await
    }

    async fn load_session(&self, session_id: Uuid) -> StorageResult<Option<SessionSnapshot>> {
        self.inner.load_session(session_id).await
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionSummary>> {
        self.inner.list_sessions().await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}

pub fn settings() -> MonitorSettings {
    MonitorSettings {
        poll_interval: TEST_INTERVAL,
        ..MonitorSettings::default()
    }
}

pub fn engine_with(feed: Arc<ScriptedFeed>, store: Arc<RecordingStore>) -> Engine {
    Engine::new(EngineContext {
        feed,
        store,
        settings: settings(),
    })
}

pub fn engine(steps: Vec<Step>) -> (Engine, Arc<ScriptedFeed>, Arc<RecordingStore>) {
    let feed = ScriptedFeed::new(steps);
    let store = RecordingStore::new();
    (engine_with(feed.clone(), store.clone()), feed, store)
}

pub fn post(id: &str, event_time: DateTime<Utc>) -> ActivityItem {
    ActivityItem {
        id: id.to_string(),
        kind: ActivityKind::Post,
        title: format!("Release notes discussion {id}"),
        body: "Compiler performance improved again this release".to_string(),
        source_group: "rust".to_string(),
        author: Some("someone".to_string()),
        event_time,
        url: format!("https://example.com/{id}"),
        score: 10,
        num_comments: 2,
    }
}

pub fn comment(id: &str, event_time: DateTime<Utc>) -> ActivityItem {
    ActivityItem {
        kind: ActivityKind::Comment,
        title: String::new(),
        body: format!("Borrow checker comment {id}"),
        ..post(id, event_time)
    }
}

/// Posts with the given ids, one minute apart, first id newest
pub fn posts(ids: &[&str]) -> Vec<ActivityItem> {
    let now = Utc::now();
    ids.iter()
        .enumerate()
        .map(|(i, id)| post(id, now - chrono::Duration::minutes(i as i64)))
        .collect()
}

pub fn ids(items: &[ActivityItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
