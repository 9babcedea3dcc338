//! MARTA rail feed HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::TrainFeed;
use super::error::FeedError;
use super::types::Train;

/// Default endpoint for MARTA real-time rail arrivals.
const DEFAULT_BASE_URL: &str =
    "https://developer.itsmarta.com/RealtimeTrain/RestServiceNextTrain/GetRealtimeArrivals";

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the MARTA client.
#[derive(Debug, Clone)]
pub struct MartaConfig {
    /// API key, sent as the `apikey` query parameter
    pub api_key: String,
    /// Endpoint URL (defaults to production MARTA)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl MartaConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom endpoint URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// MARTA real-time rail API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MartaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MartaClient {
    /// Create a new MARTA client with the given configuration.
    pub fn new(config: MartaConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl TrainFeed for MartaClient {
    async fn fetch_trains(&self) -> Result<Vec<Train>, FeedError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FeedError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        let trains: Vec<Train> = serde_json::from_str(&body).map_err(|e| {
            debug!(body = %body.chars().take(500).collect::<String>(), "unparseable feed body");
            FeedError::Json {
                message: e.to_string(),
            }
        })?;

        debug!(count = trains.len(), "fetched trains");
        Ok(trains)
    }
}
