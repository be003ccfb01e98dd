//! Space-Weather Feed Client
//!
//! Provides HTTP access to upstream space-weather feeds:
//! - NOAA SWPC JSON array feeds (Kp-index, solar-wind plasma, magnetic field)
//! - NASA DONKI coronal mass ejection alerts

pub mod cme;
mod error;
mod reader;

pub use cme::{CmeAlert, CmeFeed, CmeFeedConfig};
pub use error::{FeedError, FeedFailure};
pub use reader::{FeedReader, FeedReaderConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
