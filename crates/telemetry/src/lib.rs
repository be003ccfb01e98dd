//! Telemetry Decoding and Selection
//!
//! Turns raw feed rows into typed readings using per-feed schemas and selects
//! the authoritative latest sample.

mod error;
mod reading;
pub mod schema;
mod selector;

pub use error::MalformedRow;
pub use reading::{parse_timestamp, Provenance, Reading, OBSERVED_MARKER};
pub use schema::{fields, FeedSchema, FieldSpec};
pub use selector::{select_latest, InsufficientData, SelectedReading, Selection};
