//! Actor-based polling
//!
//! Every monitored target is driven by its own [`PollerActor`] running as
//! an independent tokio task. The engine keeps a [`PollerHandle`] per target
//! and talks to it over an mpsc command channel; state changes are fanned
//! out to observers on a broadcast channel of [`MonitorEvent`]s.
//!
//! ```text
//!                 ┌──────────────┐
//!                 │    Engine    │ registry + pollers
//!                 └──────┬───────┘
//!          spawns        │        stops
//!        ┌───────────────┼───────────────┐
//!        │               │               │
//! ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//! │  Poller 1   │ │  Poller 2   │ │  Poller N   │
//! └──────┬──────┘ └──────┬──────┘ └──────┬──────┘
//!        └────── run_tick(target) ───────┘
//!                        │
//!              ┌─────────▼─────────┐
//!              │ broadcast channel │ MonitorEvent
//!              └───────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: `PollNow` and `Shutdown` via mpsc
//! 2. **Events**: `MonitorEvent` via broadcast
//! 3. **Request/Response**: oneshot channel carrying the `TickOutcome` of `PollNow`

pub mod messages;
pub mod poller;

pub use messages::{MonitorEvent, PollerCommand, TickOutcome};
pub use poller::{PollerActor, PollerHandle, TickRunner};
