//! Application state for the web layer.

use std::sync::Arc;

use crate::feed::TrainFeed;
use crate::slack::RequestVerifier;

/// Shared application state.
///
/// Read-only after construction; every request works on its own data.
#[derive(Clone)]
pub struct AppState {
    /// Transit feed, shared with the poller
    pub feed: Arc<dyn TrainFeed>,

    /// Signature verifier. `None` disables authentication (local debugging only).
    pub verifier: Option<Arc<RequestVerifier>>,
}

impl AppState {
    /// State that verifies every command request.
    pub fn new(feed: Arc<dyn TrainFeed>, verifier: RequestVerifier) -> Self {
        Self {
            feed,
            verifier: Some(Arc::new(verifier)),
        }
    }

    /// State that accepts unsigned requests.
    pub fn unauthenticated(feed: Arc<dyn TrainFeed>) -> Self {
        Self {
            feed,
            verifier: None,
        }
    }
}
