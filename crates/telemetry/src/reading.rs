//! Telemetry Readings
//!
//! Decodes raw feed rows into timestamped readings with named values.

use crate::error::MalformedRow;
use crate::schema::FeedSchema;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Provenance marker value for measured samples
pub const OBSERVED_MARKER: &str = "observed";

/// Whether a sample was measured or modelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Observed,
    Predicted,
}

impl Provenance {
    /// Any marker other than `observed` counts as predicted
    pub fn from_marker(marker: &str) -> Self {
        if marker.trim().eq_ignore_ascii_case(OBSERVED_MARKER) {
            Provenance::Observed
        } else {
            Provenance::Predicted
        }
    }
}

/// A single decoded telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sample time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Provenance, when the feed distinguishes observed from predicted
    pub provenance: Option<Provenance>,
    /// Named values; `None` when the feed sent null
    pub values: BTreeMap<String, Option<f64>>,
}

impl Reading {
    /// Decode one row according to a feed schema
    pub fn decode(row: &Value, schema: &FeedSchema) -> Result<Self, MalformedRow> {
        let cells = row.as_array().ok_or(MalformedRow::NotAnArray)?;

        let cell = cells
            .get(schema.timestamp_column)
            .ok_or_else(|| MalformedRow::MissingColumn {
                field: "timestamp".to_string(),
                column: schema.timestamp_column,
            })?;
        let timestamp = cell
            .as_str()
            .ok_or_else(|| MalformedRow::InvalidTimestamp(cell.to_string()))
            .and_then(parse_timestamp)?;

        let mut values = BTreeMap::new();
        for spec in &schema.fields {
            let cell = cells.get(spec.column).ok_or_else(|| MalformedRow::MissingColumn {
                field: spec.name.clone(),
                column: spec.column,
            })?;

            let value = parse_number(&spec.name, cell)?;
            if spec.required && value.is_none() {
                return Err(MalformedRow::NullField(spec.name.clone()));
            }
            values.insert(spec.name.clone(), value);
        }

        let provenance = match schema.provenance_column {
            Some(column) => {
                let cell = cells.get(column).ok_or_else(|| MalformedRow::MissingColumn {
                    field: "provenance".to_string(),
                    column,
                })?;
                Some(
                    cell.as_str()
                        .map(Provenance::from_marker)
                        .unwrap_or(Provenance::Predicted),
                )
            }
            None => None,
        };

        Ok(Self {
            timestamp,
            provenance,
            values,
        })
    }

    /// Value of a named field, `None` if absent or null
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().flatten()
    }

    /// Whether this sample is a measured value
    pub fn is_observed(&self) -> bool {
        self.provenance == Some(Provenance::Observed)
    }
}

/// Parse an ISO-8601 feed timestamp into UTC
///
/// A trailing `Z` is rewritten as `+00:00`. Timestamps without an offset are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MalformedRow> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(MalformedRow::InvalidTimestamp(raw.to_string()))
}

/// Numeric cells arrive either as JSON numbers or as numeric strings
fn parse_number(field: &str, cell: &Value) -> Result<Option<f64>, MalformedRow> {
    let non_numeric = || MalformedRow::NonNumeric {
        field: field.to_string(),
        value: cell.to_string(),
    };

    let value = match cell {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64().ok_or_else(non_numeric)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| non_numeric())?,
        _ => return Err(non_numeric()),
    };

    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(non_numeric())
    }
}
