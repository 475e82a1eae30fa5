//! Application state for the HTTP server.

use crate::config::AppConfig;
use crate::services::load_tracker::BatchTracker;
use crate::session::Session;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single analysis session, recomputed synchronously under lock
    pub session: Arc<RwLock<Session>>,
    /// Tracker for background snapshot batches
    pub load_tracker: BatchTracker,
    /// Immutable application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create application state with a fresh session at the configured
    /// default tolerance.
    pub fn new(config: AppConfig) -> Self {
        let session = Session::new(config.default_tolerance());
        Self {
            session: Arc::new(RwLock::new(session)),
            load_tracker: BatchTracker::new(),
            config: Arc::new(config),
        }
    }
}
