//! Train selection.
//!
//! Pure functions over a fetched train list. Input order is preserved and
//! the input is never modified.

use crate::feed::Train;

/// Trains whose station name is exactly `station`.
///
/// The match is case-sensitive and does not trim or normalize whitespace,
/// so "east lake station" does not match "EAST LAKE STATION".
pub fn filter_by_station(trains: &[Train], station: &str) -> Vec<Train> {
    trains
        .iter()
        .filter(|t| t.station == station)
        .cloned()
        .collect()
}

/// Trains currently reported as boarding.
pub fn detect_boarding(trains: &[Train]) -> Vec<Train> {
    trains.iter().filter(|t| t.is_boarding()).cloned().collect()
}
