//! Space-Weather Pipeline
//!
//! Wires feeds, selection, classification and storage into the two
//! request-triggered operations:
//! - storm ingestion ("check now for a new storm")
//! - aurora forecast ("compute current forecast")

mod config;
mod forecast_service;
mod storm_check;

pub use config::{FeedEndpoint, FeedsConfig, DEFAULT_KP_URL, DEFAULT_MAG_URL, DEFAULT_PLASMA_URL};
pub use forecast_service::{FeedIssue, ForecastReport, ForecastService};
pub use storm_check::{IngestError, IngestOutcome, KpObservation, StormCheck};
