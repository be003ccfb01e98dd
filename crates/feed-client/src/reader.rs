//! Feed Reader
//!
//! Fetches one upstream time-series feed over HTTP and parses it as a JSON
//! array of rows. The reader never retries; retry policy belongs to the caller.

use crate::error::{FeedError, FeedFailure};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-call timeout for feed requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent sent with every feed request
pub const DEFAULT_USER_AGENT: &str = concat!("aurora-watch/", env!("CARGO_PKG_VERSION"));

/// Feed reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedReaderConfig {
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for FeedReaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FeedReaderConfig {
    /// Per-call timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP reader for JSON array feeds
#[derive(Debug, Clone)]
pub struct FeedReader {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl FeedReader {
    /// Create a new reader from configuration
    pub fn new(config: &FeedReaderConfig) -> Result<Self, FeedError> {
        Self::with_timeout(&config.user_agent, config.timeout())
    }

    /// Create a reader with an explicit timeout
    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, FeedError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Per-call timeout applied to every request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a feed and return its rows unchanged, header row included
    pub async fn fetch_rows(&self, url: &str) -> Result<Vec<Value>, FeedError> {
        self.fetch_rows_with_query(url, &[]).await
    }

    /// Fetch a feed with query parameters appended to the URL
    pub async fn fetch_rows_with_query(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, FeedError> {
        debug!(url, timeout_ms = self.timeout.as_millis() as u64, "Fetching feed");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FeedError::unavailable(url, self.classify(e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Feed returned non-success status");
            return Err(FeedError::unavailable(url, FeedFailure::Status(status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::unavailable(url, self.classify(e)))?;

        let rows: Vec<Value> = serde_json::from_slice(&body)
            .map_err(|e| FeedError::unavailable(url, FeedFailure::MalformedBody(e.to_string())))?;

        debug!(url, rows = rows.len(), "Feed fetched");
        Ok(rows)
    }

    fn classify(&self, err: reqwest::Error) -> FeedFailure {
        if err.is_timeout() {
            FeedFailure::Timeout(self.timeout)
        } else {
            FeedFailure::Transport(err.to_string())
        }
    }
}
