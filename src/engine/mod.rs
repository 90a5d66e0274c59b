//! Monitoring engine
//!
//! The [`Engine`] is the single entry point used by the hub binary and the
//! API. It owns the [`TargetRegistry`] and one poller per monitored target,
//! both behind one lock, so every state transition (add, start, stop, apply a
//! fetch) is atomic with respect to the others.
//!
//! ## Lifecycle
//!
//! ```text
//! add ──> pending ──start──> monitoring ──stop──> dormant ──restart──> monitoring
//!            │                    │                  │
//!            └──────── remove ────┴────── remove ────┘
//! ```
//!
//! ## Stale fetches
//!
//! A fetch runs without holding the lock. Every start and stop bumps the
//! target's generation; a completed fetch is applied only if the target is
//! still active, still monitoring and on the generation the fetch began
//! under. Anything else is discarded, so a stopped target never changes.

pub mod archiver;
pub mod error;
pub mod registry;
pub mod target;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use futures::future::join_all;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

pub use archiver::{SessionSnapshot, archive};
pub use error::{EngineError, EngineResult};
pub use registry::TargetRegistry;
pub use target::{MonitoringTarget, TargetId, normalize_name};

use crate::TargetKind;
use crate::actors::{MonitorEvent, PollerHandle, TickOutcome, TickRunner};
use crate::analysis::{bucketize, detect, reference_today, summarize};
use crate::feed::{ActivityFeedClient, FeedError, FeedSnapshot};
use crate::storage::SessionStore;

/// Default time between two polls of the same target
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default bound on simultaneously active targets
pub const DEFAULT_MAX_TARGETS: usize = 5;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Tunables of the engine
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub max_targets: usize,
    /// Timezone deciding which calendar day an activity falls on
    pub reference_offset: FixedOffset,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_targets: DEFAULT_MAX_TARGETS,
            reference_offset: Utc.fix(),
        }
    }
}

/// Collaborators the engine is built from
#[derive(Clone)]
pub struct EngineContext {
    pub feed: Arc<dyn ActivityFeedClient>,
    pub store: Arc<dyn SessionStore>,
    pub settings: MonitorSettings,
}

struct MonitorState {
    registry: TargetRegistry,
    pollers: HashMap<TargetId, PollerHandle>,
}

struct EngineInner {
    state: RwLock<MonitorState>,
    feed: Arc<dyn ActivityFeedClient>,
    store: Arc<dyn SessionStore>,
    settings: MonitorSettings,
    events: broadcast::Sender<MonitorEvent>,
}

/// What a fetch needs to know about its target, captured at dispatch
struct FetchTicket {
    generation: u64,
    kind: TargetKind,
    name: String,
}

/// Handle to the monitoring engine; cheap to clone
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(context: EngineContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let registry = TargetRegistry::new(
            context.settings.max_targets,
            context.settings.reference_offset,
        );

        Self {
            inner: Arc::new(EngineInner {
                state: RwLock::new(MonitorState {
                    registry,
                    pollers: HashMap::new(),
                }),
                feed: context.feed,
                store: context.store,
                settings: context.settings,
                events,
            }),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.inner.settings
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.inner.store)
    }

    /// Receive engine events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// Register a target; it stays pending until started
    #[instrument(skip(self))]
    pub async fn add_target(&self, name: &str, kind: TargetKind) -> EngineResult<TargetId> {
        let mut state = self.inner.state.write().await;
        state.registry.add(name, kind, Utc::now())
    }

    /// Begin monitoring an active target
    ///
    /// Runs the initial fetch before returning; it only establishes the
    /// baseline and never counts new items. A failed initial fetch is
    /// recorded on the target and polling is scheduled anyway. Starting a
    /// target that is already monitoring does nothing.
    #[instrument(skip(self))]
    pub async fn start_monitoring(&self, id: TargetId) -> EngineResult<()> {
        let (generation, display_name) = {
            let mut state = self.inner.state.write().await;
            if state.registry.is_dormant(id) {
                return Err(EngineError::Inactive(id));
            }
            let target = state
                .registry
                .active_mut(id)
                .ok_or(EngineError::UnknownTarget(id))?;

            if target.is_monitoring {
                debug!("{} is already monitoring", target.display_name);
                return Ok(());
            }

            target.begin_session(Utc::now());
            (target.generation, target.display_name.clone())
        };

        info!("start monitoring {display_name}");
        self.inner.emit(MonitorEvent::MonitoringStarted {
            target_id: id,
            display_name: display_name.clone(),
        });

        // Skipped means a manual poll already claimed the initial fetch
        match self.inner.run_tick(id).await {
            TickOutcome::Discarded => debug!("{display_name} stopped during its initial fetch"),
            TickOutcome::Failed { error } => {
                warn!("initial fetch of {display_name} failed, polling anyway: {error}");
            }
            TickOutcome::Skipped | TickOutcome::Applied { .. } => {}
        }

        let mut state = self.inner.state.write().await;
        let current = state
            .registry
            .active(id)
            .is_some_and(|t| t.is_monitoring && t.generation == generation);

        if current && !state.pollers.contains_key(&id) {
            let runner: Arc<dyn TickRunner> = self.inner.clone();
            let handle = PollerHandle::spawn(
                id,
                Arc::downgrade(&runner),
                self.inner.settings.poll_interval,
            );
            state.pollers.insert(id, handle);
        }

        Ok(())
    }

    /// Stop monitoring and archive the session
    ///
    /// The target leaves the active set and its poller is cancelled before
    /// the snapshot is persisted. Returns the archived snapshot, or `None`
    /// if the target was not active (stop is idempotent). If persisting
    /// fails the target is still stopped and `PersistenceFailed` is returned.
    #[instrument(skip(self))]
    pub async fn stop_monitoring(&self, id: TargetId) -> EngineResult<Option<SessionSnapshot>> {
        let (snapshot, poller) = {
            let mut state = self.inner.state.write().await;
            let Some(snapshot) = state
                .registry
                .deactivate(id)
                .map(|target| archive(target, Utc::now()))
            else {
                debug!("{id} is not active, nothing to stop");
                return Ok(None);
            };
            (snapshot, state.pollers.remove(&id))
        };

        if let Some(poller) = poller {
            poller.shutdown().await;
        }

        info!(
            "stopped monitoring {} ({} new items this session)",
            snapshot.display_name, snapshot.new_activity_count
        );
        self.inner.emit(MonitorEvent::MonitoringStopped {
            target_id: id,
            display_name: snapshot.display_name.clone(),
        });

        if let Err(e) = self.inner.store.save_session(&snapshot).await {
            error!("failed to archive session of {}: {}", snapshot.display_name, e);
            return Err(EngineError::PersistenceFailed(e));
        }

        self.inner.emit(MonitorEvent::SessionArchived {
            target_id: id,
            session_id: snapshot.session_id,
            display_name: snapshot.display_name.clone(),
        });

        Ok(Some(snapshot))
    }

    /// Resume a stopped or read-only target
    ///
    /// The target re-enters the active set (subject to capacity and
    /// duplicates), gets a fresh session and keeps its activities as the
    /// baseline. Restarting an active target behaves like start.
    #[instrument(skip(self))]
    pub async fn restart_monitoring(&self, id: TargetId) -> EngineResult<()> {
        {
            let mut state = self.inner.state.write().await;
            if state.registry.active(id).is_none() {
                state.registry.reactivate(id)?;
            }
        }

        self.start_monitoring(id).await
    }

    /// Forget a target entirely; no session is archived
    ///
    /// Returns whether the target existed.
    #[instrument(skip(self))]
    pub async fn remove_target(&self, id: TargetId) -> bool {
        let (removed, poller) = {
            let mut state = self.inner.state.write().await;
            (state.registry.remove(id), state.pollers.remove(&id))
        };

        if let Some(poller) = poller {
            poller.shutdown().await;
        }

        match removed {
            Some(target) => {
                info!("removed {}", target.display_name);
                true
            }
            None => false,
        }
    }

    /// Copy of every known target, active ones first
    pub async fn list_targets(&self) -> Vec<MonitoringTarget> {
        self.inner.state.read().await.registry.list()
    }

    pub async fn get_target(&self, id: TargetId) -> EngineResult<MonitoringTarget> {
        self.inner
            .state
            .read()
            .await
            .registry
            .get(id)
            .cloned()
            .ok_or(EngineError::UnknownTarget(id))
    }

    /// Run a poll tick right away
    #[instrument(skip(self))]
    pub async fn poll_now(&self, id: TargetId) -> EngineResult<TickOutcome> {
        let poller = {
            let state = self.inner.state.read().await;
            if state.registry.get(id).is_none() {
                return Err(EngineError::UnknownTarget(id));
            }
            state.pollers.get(&id).cloned()
        };

        let outcome = match poller {
            Some(poller) => poller.poll_now().await.unwrap_or(TickOutcome::Skipped),
            None => self.inner.run_tick(id).await,
        };

        Ok(outcome)
    }

    /// Show an archived session as a read-only target
    ///
    /// Read-only targets never poll and do not count toward capacity.
    pub async fn load_archived_as_read_only(&self, snapshot: SessionSnapshot) -> TargetId {
        self.inner
            .state
            .write()
            .await
            .registry
            .insert_read_only(snapshot)
    }

    /// Fetch an archived session from the store and load it read-only
    #[instrument(skip(self))]
    pub async fn load_session(&self, session_id: Uuid) -> EngineResult<TargetId> {
        let snapshot = self
            .inner
            .store
            .load_session(session_id)
            .await?
            .ok_or(EngineError::UnknownSession(session_id))?;

        Ok(self.load_archived_as_read_only(snapshot).await)
    }

    /// Stop every active target, archiving each session
    pub async fn stop_all(&self) -> Vec<(TargetId, EngineResult<Option<SessionSnapshot>>)> {
        let ids = self.inner.state.read().await.registry.active_ids();
        debug!("stopping {} targets", ids.len());

        join_all(ids.into_iter().map(|id| async move {
            let result = self.stop_monitoring(id).await;
            (id, result)
        }))
        .await
    }
}

impl EngineInner {
    fn emit(&self, event: MonitorEvent) {
        if self.events.send(event).is_err() {
            trace!("no subscribers for monitor event");
        }
    }

    /// Claim the target for a fetch, or explain why not
    async fn begin_fetch(&self, id: TargetId) -> Result<FetchTicket, TickOutcome> {
        let mut state = self.state.write().await;
        let Some(target) = state.registry.active_mut(id) else {
            trace!("{id} is not active, skipping tick");
            return Err(TickOutcome::Skipped);
        };

        if !target.is_monitoring {
            trace!("{} is not monitoring, skipping tick", target.display_name);
            return Err(TickOutcome::Skipped);
        }

        if target.is_fetching {
            debug!("{} is still fetching, skipping tick", target.display_name);
            return Err(TickOutcome::Skipped);
        }

        target.is_fetching = true;
        Ok(FetchTicket {
            generation: target.generation,
            kind: target.kind,
            name: target.name.clone(),
        })
    }

    /// Apply a completed fetch if the target is still on the same session
    async fn finish_fetch(
        &self,
        id: TargetId,
        ticket: FetchTicket,
        result: Result<FeedSnapshot, FeedError>,
    ) -> TickOutcome {
        let offset = self.settings.reference_offset;
        let mut state = self.state.write().await;

        let Some(target) = state
            .registry
            .active_mut(id)
            .filter(|t| t.is_monitoring && t.generation == ticket.generation)
        else {
            debug!("discarding stale fetch for {id}");
            self.emit(MonitorEvent::StaleFetchDiscarded { target_id: id });
            return TickOutcome::Discarded;
        };

        target.is_fetching = false;
        let now = Utc::now();

        match result {
            Ok(snapshot) => {
                let previous = target.has_baseline.then_some(target.activities.as_slice());
                let diff = detect(previous, snapshot.items);

                target.word_summary = summarize(&diff.activities, &snapshot.profile);
                target.activity_summary =
                    bucketize(target.kind, &diff.activities, reference_today(offset), offset);
                target.activities = diff.activities;
                target.profile = snapshot.profile;
                target.new_activity_count += diff.new_items as u64;
                target.has_baseline = true;
                target.last_fetch_time = Some(now);
                target.last_error = None;

                debug!(
                    "{}: {} new of {} items",
                    target.display_name,
                    diff.new_items,
                    target.activities.len()
                );
                self.emit(MonitorEvent::TargetUpdated {
                    target_id: id,
                    display_name: target.display_name.clone(),
                    new_items: diff.new_items,
                    total_items: target.activities.len(),
                    timestamp: now,
                });

                TickOutcome::Applied {
                    new_items: diff.new_items,
                }
            }
            Err(e) => {
                let error = e.to_string();
                warn!("fetch for {} failed: {}", target.display_name, error);
                target.last_error = Some(error.clone());

                self.emit(MonitorEvent::FetchFailed {
                    target_id: id,
                    display_name: target.display_name.clone(),
                    error: error.clone(),
                    timestamp: now,
                });

                TickOutcome::Failed { error }
            }
        }
    }
}

#[async_trait]
impl TickRunner for EngineInner {
    async fn run_tick(&self, target_id: TargetId) -> TickOutcome {
        let ticket = match self.begin_fetch(target_id).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };

        trace!("fetching {}{}", ticket.kind.prefix(), ticket.name);
        let result = self.feed.fetch(ticket.kind, &ticket.name).await;

        self.finish_fetch(target_id, ticket, result).await
    }
}
