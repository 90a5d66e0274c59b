//! PollerActor - Drives the periodic fetch of one target
//!
//! Each monitored target gets its own poller. The poller owns only the
//! timer; the fetch itself and every state change go through the engine,
//! which decides whether a tick may fetch and whether a completed fetch
//! may still be applied.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → spawn TickRunner::run_tick(target) → engine applies or discards
//!     ↑
//!     └─── Commands (PollNow, Shutdown)
//! ```

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, instrument, trace, warn};

use super::messages::{PollerCommand, TickOutcome};
use crate::engine::TargetId;

/// Something that can run one poll tick for a target
#[async_trait]
pub trait TickRunner: Send + Sync + 'static {
    async fn run_tick(&self, target_id: TargetId) -> TickOutcome;
}

/// Actor that schedules ticks for a single target
///
/// The first tick fires one interval after spawn. Ticks never wait for each
/// other; a tick that finds a fetch still in flight is skipped by the runner.
pub struct PollerActor {
    target_id: TargetId,

    /// Weak so a forgotten poller never keeps the engine alive
    runner: Weak<dyn TickRunner>,

    command_rx: mpsc::Receiver<PollerCommand>,

    interval_duration: Duration,
}

impl PollerActor {
    pub fn new(
        target_id: TargetId,
        runner: Weak<dyn TickRunner>,
        command_rx: mpsc::Receiver<PollerCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            target_id,
            runner,
            command_rx,
            interval_duration,
        }
    }

    /// Run until shutdown, until the handle is dropped, or until the runner is gone
    #[instrument(skip(self), fields(target = %self.target_id))]
    pub async fn run(mut self) {
        debug!("starting poller every {:?}", self.interval_duration);

        let mut ticker = interval_at(
            Instant::now() + self.interval_duration,
            self.interval_duration,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.dispatch(None) {
                        break;
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(PollerCommand::PollNow { respond_to }) => {
                            debug!("received PollNow command");
                            if !self.dispatch(Some(respond_to)) {
                                break;
                            }
                        }

                        Some(PollerCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            debug!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("poller stopped");
    }

    /// Spawn one tick; returns false once the runner has been dropped
    fn dispatch(&self, respond_to: Option<oneshot::Sender<TickOutcome>>) -> bool {
        let Some(runner) = self.runner.upgrade() else {
            warn!("tick runner dropped, shutting down");
            return false;
        };

        let target_id = self.target_id;
        tokio::spawn(async move {
            let outcome = runner.run_tick(target_id).await;
            trace!("tick for {target_id} finished: {outcome:?}");
            if let Some(respond_to) = respond_to {
                let _ = respond_to.send(outcome);
            }
        });

        true
    }
}

/// Handle for controlling a PollerActor
#[derive(Debug, Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,

    pub target_id: TargetId,
}

impl PollerHandle {
    /// Spawn a poller for `target_id` as a tokio task
    pub fn spawn(target_id: TargetId, runner: Weak<dyn TickRunner>, interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = PollerActor::new(target_id, runner, cmd_rx, interval);
        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            target_id,
        }
    }

    /// Run a tick now and wait for its outcome
    ///
    /// Returns `None` if the poller has already exited.
    pub async fn poll_now(&self) -> Option<TickOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .ok()?;
        rx.await.ok()
    }

    /// Ask the poller to exit; a poller that already exited is fine
    pub async fn shutdown(&self) {
        if self.sender.send(PollerCommand::Shutdown).await.is_err() {
            trace!("poller for {} already stopped", self.target_id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
