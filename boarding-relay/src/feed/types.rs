//! MARTA real-time rail arrival DTOs.
//!
//! The feed returns a flat JSON array with upper-case keys. Only the
//! station, direction and waiting time are required; the rest are carried
//! through for display and debugging and never used for matching.

use serde::{Deserialize, Serialize};

/// Sentinel `WAITING_TIME` value reported while a train is at the platform.
pub const BOARDING: &str = "Boarding";

/// A single train arrival as reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Train {
    /// Station name, e.g. "FIVE POINTS STATION".
    pub station: String,

    /// Compass direction of travel ("N", "S", "E" or "W").
    pub direction: String,

    /// Free-form wait ("3 min", "Arriving") or [`BOARDING`].
    pub waiting_time: String,

    /// Terminus of the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Line colour ("RED", "GOLD", "BLUE", "GREEN").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_id: Option<String>,

    /// Next arrival time at the station ("10:42:03 AM").
    #[serde(rename = "NEXT_ARR", default, skip_serializing_if = "Option::is_none")]
    pub next_arrival: Option<String>,

    /// Seconds until arrival, as a string. Negative once the train has arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_seconds: Option<String>,
}

impl Train {
    /// Create a train with only the fields used for filtering and formatting.
    pub fn new(
        station: impl Into<String>,
        direction: impl Into<String>,
        waiting_time: impl Into<String>,
    ) -> Self {
        Self {
            station: station.into(),
            direction: direction.into(),
            waiting_time: waiting_time.into(),
            destination: None,
            line: None,
            train_id: None,
            next_arrival: None,
            waiting_seconds: None,
        }
    }

    /// Whether the feed reports this train as boarding.
    ///
    /// The comparison is exact: "boarding" or "BOARDING" do not count.
    pub fn is_boarding(&self) -> bool {
        self.waiting_time == BOARDING
    }
}
