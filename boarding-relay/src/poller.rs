//! Background boarding poller.
//!
//! Each cycle fetches the feed, picks out boarding trains, and sends one
//! webhook alert per boarding train. Nothing is remembered between cycles:
//! a train still boarding on the next cycle is alerted again. Alerting is
//! therefore at-least-once and may repeat for as long as the train sits at
//! the platform.
//!
//! Cancellation is checked once per cycle, at the top of the loop. A cycle
//! that has started always finishes its fetch and all of its dispatches.
//! The sleep between cycles wakes early on cancellation, so shutdown waits
//! at most one fetch plus its dispatches, never a full poll interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::arrivals::detect_boarding;
use crate::feed::TrainFeed;
use crate::slack::{NotificationMessage, Notifier};

/// Lifecycle of the poller. The only transition is `Running → Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Running,
    Cancelled,
}

/// Shared cancellation handle.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<PollState>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PollState::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Move to `Cancelled`.
    ///
    /// Returns `true` for the call that performed the transition and
    /// `false` for every later call.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|state| match state {
            PollState::Running => {
                *state = PollState::Cancelled;
                true
            }
            PollState::Cancelled => false,
        })
    }

    pub fn state(&self) -> PollState {
        *self.tx.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == PollState::Cancelled
    }

    fn subscribe(&self) -> watch::Receiver<PollState> {
        self.tx.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Trains returned by the feed
    pub fetched: usize,
    /// Trains found boarding
    pub boarding: usize,
    /// Alerts the webhook accepted
    pub delivered: usize,
    /// Alerts that failed to send
    pub failed: usize,
    /// Whether the fetch itself failed
    pub fetch_failed: bool,
}

/// Polls the feed and relays boarding alerts.
pub struct BoardingPoller {
    feed: Arc<dyn TrainFeed>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl BoardingPoller {
    pub fn new(feed: Arc<dyn TrainFeed>, notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self {
            feed,
            notifier,
            interval,
        }
    }

    /// Run one fetch-filter-notify pass.
    ///
    /// Fetch and dispatch failures are logged and counted, never returned.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        debug!("getting trains");
        let trains = match self.feed.fetch_trains().await {
            Ok(trains) => trains,
            Err(e) => {
                warn!(error = %e, "failed to fetch trains");
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = trains.len();

        let boarding = detect_boarding(&trains);
        report.boarding = boarding.len();

        for train in &boarding {
            info!(station = %train.station, direction = %train.direction, "train is boarding");
            let message = NotificationMessage::boarding_alert(train);
            match self.notifier.notify(&message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(error = %e, station = %train.station, "failed to send boarding alert");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Poll until `shutdown` is cancelled. Returns the number of completed cycles.
    pub async fn run(self, shutdown: Shutdown) -> u64 {
        let mut rx = shutdown.subscribe();
        let mut cycles = 0u64;
        info!(interval_secs = self.interval.as_secs(), "boarding poller started");

        loop {
            if *rx.borrow_and_update() == PollState::Cancelled {
                break;
            }

            let report = self.run_cycle().await;
            cycles += 1;
            debug!(cycle = cycles, ?report, "poll cycle finished");

            // `shutdown` keeps the sender alive, so `changed` only resolves
            // on a real state change.
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = rx.changed() => {}
            }
        }

        info!(cycles, "boarding poller stopped");
        cycles
    }
}
