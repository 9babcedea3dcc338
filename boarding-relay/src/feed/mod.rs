//! MARTA real-time rail feed.
//!
//! The feed is a single endpoint returning every train currently tracked
//! by the network. There is no per-station query; callers fetch the whole
//! list and filter locally (see [`crate::arrivals`]).
//!
//! Everything downstream talks to the feed through [`TrainFeed`], so the
//! live client and the file-backed mock are interchangeable.

mod client;
mod error;
mod mock;
mod types;

use async_trait::async_trait;

pub use client::{MartaClient, MartaConfig};
pub use error::FeedError;
pub use mock::MockFeed;
pub use types::{BOARDING, Train};

/// Capability to fetch the current set of trains.
///
/// Implementations must be safe to call concurrently: the poller and every
/// in-flight command request share one instance.
#[async_trait]
pub trait TrainFeed: Send + Sync {
    /// Fetch every train the feed currently reports.
    async fn fetch_trains(&self) -> Result<Vec<Train>, FeedError>;
}
