//! Latest Reading Selection
//!
//! Picks the authoritative sample from a chronological feed: the newest
//! observed row, falling back to the newest row of any provenance.

use crate::reading::Reading;
use crate::schema::FeedSchema;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Why a feed produced no usable sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientData {
    /// The feed returned zero rows
    EmptyFeed,
    /// The feed returned only header rows
    HeaderOnly,
    /// Every data row was malformed
    NoUsableRows,
}

impl fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsufficientData::EmptyFeed => write!(f, "feed returned no rows"),
            InsufficientData::HeaderOnly => write!(f, "feed returned only a header row"),
            InsufficientData::NoUsableRows => write!(f, "feed returned no usable rows"),
        }
    }
}

/// A selected sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedReading {
    pub reading: Reading,
    /// True when no observed row existed and a predicted row was used
    pub degraded: bool,
    /// Malformed rows skipped during the scan
    pub skipped_rows: usize,
}

/// Outcome of selecting from a feed
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Selected(SelectedReading),
    InsufficientData(InsufficientData),
}

impl Selection {
    /// The selected sample, if any
    pub fn selected(self) -> Option<SelectedReading> {
        match self {
            Selection::Selected(s) => Some(s),
            Selection::InsufficientData(_) => None,
        }
    }
}

/// Select the most recent observed reading from chronologically ordered rows
pub fn select_latest(rows: &[Value], schema: &FeedSchema) -> Selection {
    if rows.is_empty() {
        return Selection::InsufficientData(InsufficientData::EmptyFeed);
    }

    let data = &rows[schema.header_rows.min(rows.len())..];
    if data.is_empty() {
        return Selection::InsufficientData(InsufficientData::HeaderOnly);
    }

    let mut fallback: Option<Reading> = None;
    let mut skipped_rows = 0;

    for row in data.iter().rev() {
        let reading = match Reading::decode(row, schema) {
            Ok(reading) => reading,
            Err(e) => {
                debug!(error = %e, "Skipping malformed row");
                skipped_rows += 1;
                continue;
            }
        };

        if schema.provenance_column.is_none() || reading.is_observed() {
            return Selection::Selected(SelectedReading {
                reading,
                degraded: false,
                skipped_rows,
            });
        }

        if fallback.is_none() {
            fallback = Some(reading);
        }
    }

    match fallback {
        Some(reading) => {
            warn!(
                timestamp = %reading.timestamp,
                "No observed reading found, using latest predicted value"
            );
            Selection::Selected(SelectedReading {
                reading,
                degraded: true,
                skipped_rows,
            })
        }
        None => Selection::InsufficientData(InsufficientData::NoUsableRows),
    }
}
