//! Command-line and environment configuration.
//!
//! Every flag can also be supplied through the environment variable named
//! next to it, which is how the service is normally deployed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

/// Errors from validating a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("a signing secret is required unless --skip-signature-check is set")]
    MissingSigningSecret,

    #[error("a MARTA API key is required unless --mock-trains is set")]
    MissingApiKey,
}

/// Relay MARTA boarding events to Slack.
#[derive(Parser, Debug, Clone)]
#[command(name = "boarding-relay")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// MARTA API key
    #[arg(long, env = "MARTA_API_KEY", hide_env_values = true)]
    pub marta_api_key: Option<String>,

    /// Override the MARTA real-time arrivals endpoint
    #[arg(long, env = "MARTA_FEED_URL")]
    pub feed_url: Option<String>,

    /// Serve trains from a JSON file instead of the live feed
    #[arg(long, env = "MOCK_TRAINS")]
    pub mock_trains: Option<PathBuf>,

    /// Slack incoming webhook for boarding alerts
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Url,

    /// Seconds between feed polls
    #[arg(long, env = "POLL_TIME_IN_SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_time_in_seconds: u64,

    /// Slack signing secret for verifying slash commands
    #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: Option<String>,

    /// Accept unsigned slash commands (local debugging only)
    #[arg(long, env = "SKIP_SIGNATURE_CHECK")]
    pub skip_signature_check: bool,

    /// Enable debug logging
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Address to serve the slash-command endpoint on
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Timeout for each outbound request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Check constraints that span several flags.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.skip_signature_check && is_blank(&self.signing_secret) {
            return Err(ConfigError::MissingSigningSecret);
        }
        if self.mock_trains.is_none() && is_blank(&self.marta_api_key) {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_time_in_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
