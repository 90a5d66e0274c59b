//! API shared state

use crate::engine::Engine;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Engine handle; the session store is reached through it
    pub engine: Engine,
}

impl ApiState {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}
