//! Row Decoding Error Types

use thiserror::Error;

/// A feed row that is present but cannot be decoded
///
/// Callers skip the offending row; a malformed row never aborts a feed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedRow {
    /// Row is not a JSON array
    #[error("Row is not an array")]
    NotAnArray,

    /// Row is shorter than the schema expects
    #[error("Missing column {column} for {field}")]
    MissingColumn { field: String, column: usize },

    /// Timestamp cell is absent or unparseable
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Value cell is present but not numeric
    #[error("{field} value {value} is not numeric")]
    NonNumeric { field: String, value: String },

    /// Required value cell is null
    #[error("Missing required field: {0}")]
    NullField(String),
}
