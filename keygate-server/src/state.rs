//! Application state

use keygate_core::Gate;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The key gate
    pub gate: Arc<Gate>,

    /// Server start time
    pub start_time: Instant,

    /// Debug mode flag
    pub debug: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(gate: Arc<Gate>) -> Self {
        Self::with_debug(gate, false)
    }

    /// Create application state with debug mode
    pub fn with_debug(gate: Arc<Gate>, debug: bool) -> Self {
        Self {
            gate,
            start_time: Instant::now(),
            debug,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
