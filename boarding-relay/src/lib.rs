//! MARTA boarding relay.
//!
//! Polls the MARTA real-time rail feed and posts a Slack alert whenever a
//! train is boarding, and answers `/find-arrival <station>` slash commands
//! with the trains currently reported at that station.

pub mod arrivals;
pub mod config;
pub mod feed;
pub mod poller;
pub mod slack;
pub mod web;
