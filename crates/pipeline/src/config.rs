//! Feed Endpoint Configuration

use feed_client::{FeedReaderConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use telemetry::FeedSchema;

pub const DEFAULT_KP_URL: &str =
    "https://services.swpc.noaa.gov/products/noaa-planetary-k-index.json";
pub const DEFAULT_PLASMA_URL: &str =
    "https://services.swpc.noaa.gov/products/solar-wind/plasma-1-minute.json";
pub const DEFAULT_MAG_URL: &str =
    "https://services.swpc.noaa.gov/products/solar-wind/mag-1-minute.json";

/// One upstream feed: where it lives and how its rows are laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEndpoint {
    pub url: String,
    pub schema: FeedSchema,
}

impl FeedEndpoint {
    pub fn new(url: impl Into<String>, schema: FeedSchema) -> Self {
        Self {
            url: url.into(),
            schema,
        }
    }
}

/// Upstream feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Planetary K-index feed
    pub kp: FeedEndpoint,
    /// Solar-wind plasma feed
    pub plasma: FeedEndpoint,
    /// Solar-wind magnetic field feed
    pub magnetic: FeedEndpoint,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            kp: FeedEndpoint::new(DEFAULT_KP_URL, FeedSchema::kp_index()),
            plasma: FeedEndpoint::new(DEFAULT_PLASMA_URL, FeedSchema::plasma()),
            magnetic: FeedEndpoint::new(DEFAULT_MAG_URL, FeedSchema::magnetic()),
        }
    }
}

impl FeedsConfig {
    /// Reader settings shared by every feed
    pub fn reader_config(&self) -> FeedReaderConfig {
        FeedReaderConfig {
            timeout_secs: self.timeout_secs,
            user_agent: self.user_agent.clone(),
        }
    }
}
