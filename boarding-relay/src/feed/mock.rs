//! File-backed feed for running without MARTA credentials.
//!
//! Loads a JSON array in the same shape the live feed returns and serves
//! it on every fetch.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::TrainFeed;
use super::error::FeedError;
use super::types::Train;

/// Feed that serves a fixed train list.
#[derive(Clone)]
pub struct MockFeed {
    trains: Arc<RwLock<Vec<Train>>>,
}

impl MockFeed {
    /// Load trains from a JSON file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let trains = load(path.as_ref())?;
        Ok(Self::from_trains(trains))
    }

    /// Serve an in-memory train list.
    pub fn from_trains(trains: Vec<Train>) -> Self {
        Self {
            trains: Arc::new(RwLock::new(trains)),
        }
    }

    /// Replace the served trains with the contents of `path`.
    ///
    /// On error the previous list is kept.
    pub async fn reload(&self, path: impl AsRef<Path>) -> Result<usize, FeedError> {
        let fresh = load(path.as_ref())?;
        let count = fresh.len();
        *self.trains.write().await = fresh;
        Ok(count)
    }
}

#[async_trait]
impl TrainFeed for MockFeed {
    async fn fetch_trains(&self) -> Result<Vec<Train>, FeedError> {
        Ok(self.trains.read().await.clone())
    }
}

fn load(path: &Path) -> Result<Vec<Train>, FeedError> {
    let json = std::fs::read_to_string(path).map_err(|e| FeedError::MockData {
        message: format!("failed to read {:?}: {}", path, e),
    })?;

    serde_json::from_str(&json).map_err(|e| FeedError::MockData {
        message: format!("failed to parse {:?}: {}", path, e),
    })
}
