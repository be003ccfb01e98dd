//! Feed Schemas
//!
//! Maps named fields to column positions for each upstream feed. This is the
//! one place that changes when an upstream feed changes shape.

use serde::{Deserialize, Serialize};

/// Field names shared by schemas and consumers
pub mod fields {
    pub const KP_INDEX: &str = "kp_index";
    pub const A_INDEX: &str = "a_index";
    pub const STATION_COUNT: &str = "station_count";
    pub const DENSITY: &str = "density";
    pub const SPEED: &str = "speed";
    pub const TEMPERATURE: &str = "temperature";
    pub const BX_GSM: &str = "bx_gsm";
    pub const BY_GSM: &str = "by_gsm";
    pub const BZ_GSM: &str = "bz_gsm";
    pub const BT: &str = "bt";
}

/// A named numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Zero-based column index
    pub column: usize,
    /// Whether a null cell makes the row malformed
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    /// Optional field at the given column
    pub fn optional(name: &str, column: usize) -> Self {
        Self {
            name: name.to_string(),
            column,
            required: false,
        }
    }

    /// Required field at the given column
    pub fn required(name: &str, column: usize) -> Self {
        Self {
            name: name.to_string(),
            column,
            required: true,
        }
    }
}

/// Row layout of one feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSchema {
    /// Leading non-data rows to discard
    pub header_rows: usize,
    /// Column holding the ISO-8601 timestamp
    pub timestamp_column: usize,
    /// Named numeric columns
    pub fields: Vec<FieldSpec>,
    /// Column holding the `observed`/`predicted` marker, if the feed has one
    pub provenance_column: Option<usize>,
}

impl FeedSchema {
    /// NOAA planetary K-index: `[time_tag, kp_index, a_index, station_count, provenance]`
    pub fn kp_index() -> Self {
        Self {
            header_rows: 1,
            timestamp_column: 0,
            fields: vec![
                FieldSpec::required(fields::KP_INDEX, 1),
                FieldSpec::optional(fields::A_INDEX, 2),
                FieldSpec::optional(fields::STATION_COUNT, 3),
            ],
            provenance_column: Some(4),
        }
    }

    /// NOAA solar-wind plasma: `[time_tag, density, speed, temperature]`
    pub fn plasma() -> Self {
        Self {
            header_rows: 1,
            timestamp_column: 0,
            fields: vec![
                FieldSpec::optional(fields::DENSITY, 1),
                FieldSpec::optional(fields::SPEED, 2),
                FieldSpec::optional(fields::TEMPERATURE, 3),
            ],
            provenance_column: None,
        }
    }

    /// NOAA solar-wind magnetic field:
    /// `[time_tag, bx_gsm, by_gsm, bz_gsm, lon_gsm, lat_gsm, bt]`
    pub fn magnetic() -> Self {
        Self {
            header_rows: 1,
            timestamp_column: 0,
            fields: vec![
                FieldSpec::optional(fields::BX_GSM, 1),
                FieldSpec::optional(fields::BY_GSM, 2),
                FieldSpec::optional(fields::BZ_GSM, 3),
                FieldSpec::optional(fields::BT, 6),
            ],
            provenance_column: None,
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kp_schema_columns() {
        let schema = FeedSchema::kp_index();
        assert_eq!(schema.field(fields::KP_INDEX).map(|f| f.column), Some(1));
        assert!(schema.field(fields::KP_INDEX).unwrap().required);
        assert_eq!(schema.provenance_column, Some(4));
    }

    #[test]
    fn test_magnetic_bz_column() {
        let schema = FeedSchema::magnetic();
        assert_eq!(schema.field(fields::BZ_GSM).map(|f| f.column), Some(3));
        assert!(schema.provenance_column.is_none());
    }

    #[test]
    fn test_unknown_field() {
        assert!(FeedSchema::plasma().field(fields::BZ_GSM).is_none());
    }
}
