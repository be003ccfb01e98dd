//! Feed Error Types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading an upstream feed
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed could not be retrieved or parsed
    #[error("Feed unavailable ({url}): {cause}")]
    Unavailable {
        url: String,
        #[source]
        cause: FeedFailure,
    },

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The configured look-back window cannot be represented
    #[error("Invalid query window of {0} days")]
    InvalidWindow(i64),
}

impl FeedError {
    /// Wrap a failure cause for the given URL
    pub fn unavailable(url: impl Into<String>, cause: FeedFailure) -> Self {
        FeedError::Unavailable {
            url: url.into(),
            cause,
        }
    }

    /// Whether this error was caused by the per-call timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FeedError::Unavailable {
                cause: FeedFailure::Timeout(_),
                ..
            }
        )
    }
}

/// Underlying cause of a `FeedError::Unavailable`
#[derive(Debug, Error)]
pub enum FeedFailure {
    /// No response within the per-call timeout
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS or body transfer failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Body was not a JSON array
    #[error("Malformed body: {0}")]
    MalformedBody(String),
}
