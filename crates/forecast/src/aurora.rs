//! Aurora Forecast Rules
//!
//! Combines solar-wind speed, density and the southward IMF component into a
//! discrete visibility level. Rules are evaluated in order and the first match
//! wins.
//!
//! Missing individual values are substituted with zero before the rules run.
//! A null Bz is therefore indistinguishable from a Bz of exactly 0 nT, which
//! can only ever lower the level. Only the absence of both feeds yields
//! `Unknown`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// Bz (nT) below which a `High` forecast is possible
pub const HIGH_BZ_NT: f64 = -10.0;
/// Solar-wind speed (km/s) above which a `High` forecast is possible
pub const HIGH_SPEED_KMS: f64 = 400.0;
/// Bz (nT) below which a `Moderate` forecast is possible
pub const MODERATE_BZ_NT: f64 = -5.0;
/// Solar-wind speed (km/s) above which a `Moderate` forecast is possible
pub const MODERATE_SPEED_KMS: f64 = 350.0;

pub const UNKNOWN_MESSAGE: &str = "Could not retrieve live data from NOAA.";
pub const HIGH_MESSAGE: &str =
    "Strongly negative Bz and high speed! Excellent aurora potential for high-latitude locations.";
pub const MODERATE_MESSAGE: &str =
    "Southward Bz and elevated solar wind. Auroral activity is possible.";
pub const LOW_MESSAGE: &str = "Conditions are calm. A visible aurora is not expected.";

/// Forecast level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastLevel {
    /// No live data could be obtained
    Unknown,
    Low,
    Moderate,
    High,
}

impl ForecastLevel {
    /// Fixed explanatory message for this level
    pub fn message(&self) -> &'static str {
        match self {
            ForecastLevel::Unknown => UNKNOWN_MESSAGE,
            ForecastLevel::Low => LOW_MESSAGE,
            ForecastLevel::Moderate => MODERATE_MESSAGE,
            ForecastLevel::High => HIGH_MESSAGE,
        }
    }

    /// Stable label, also used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastLevel::Unknown => "UNKNOWN",
            ForecastLevel::Low => "LOW",
            ForecastLevel::Moderate => "MODERATE",
            ForecastLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for ForecastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical unit of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Nanotesla,
    KilometersPerSecond,
    ParticlesPerCubicCentimeter,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Nanotesla => "nT",
            Unit::KilometersPerSecond => "km/s",
            Unit::ParticlesPerCubicCentimeter => "p/cm³",
        }
    }

    fn precision(&self) -> usize {
        match self {
            Unit::KilometersPerSecond => 0,
            Unit::Nanotesla | Unit::ParticlesPerCubicCentimeter => 2,
        }
    }
}

/// A measurement that may be unavailable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: Option<f64>,
    pub unit: Unit,
}

impl Measurement {
    pub fn new(value: Option<f64>, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn unavailable(unit: Unit) -> Self {
        Self { value: None, unit }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{:.*} {}", self.unit.precision(), v, self.unit.symbol()),
            None => f.write_str("N/A"),
        }
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Measurement", 3)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("unit", self.unit.symbol())?;
        s.serialize_field("display", &self.to_string())?;
        s.end()
    }
}

/// Latest solar-wind plasma values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlasmaSample {
    /// Bulk speed (km/s)
    pub speed: Option<f64>,
    /// Proton density (p/cm³)
    pub density: Option<f64>,
}

/// Latest interplanetary magnetic field values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MagneticSample {
    /// Southward component, GSM coordinates (nT)
    pub bz_gsm: Option<f64>,
}

/// Forecast thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastThresholds {
    pub high_bz_nt: f64,
    pub high_speed_kms: f64,
    pub moderate_bz_nt: f64,
    pub moderate_speed_kms: f64,
}

impl Default for ForecastThresholds {
    fn default() -> Self {
        Self {
            high_bz_nt: HIGH_BZ_NT,
            high_speed_kms: HIGH_SPEED_KMS,
            moderate_bz_nt: MODERATE_BZ_NT,
            moderate_speed_kms: MODERATE_SPEED_KMS,
        }
    }
}

/// Computed forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub level: ForecastLevel,
    pub message: &'static str,
    pub bz_gsm: Measurement,
    pub speed: Measurement,
    pub density: Measurement,
}

impl ForecastResult {
    /// Result used when neither feed produced data
    pub fn unknown() -> Self {
        Self {
            level: ForecastLevel::Unknown,
            message: ForecastLevel::Unknown.message(),
            bz_gsm: Measurement::unavailable(Unit::Nanotesla),
            speed: Measurement::unavailable(Unit::KilometersPerSecond),
            density: Measurement::unavailable(Unit::ParticlesPerCubicCentimeter),
        }
    }
}

/// Rule engine for aurora forecasts
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastEngine {
    thresholds: ForecastThresholds,
}

impl ForecastEngine {
    pub fn new(thresholds: ForecastThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ForecastThresholds {
        &self.thresholds
    }

    /// Evaluate the forecast from whatever samples were obtained
    pub fn evaluate(
        &self,
        plasma: Option<&PlasmaSample>,
        magnetic: Option<&MagneticSample>,
    ) -> ForecastResult {
        if plasma.is_none() && magnetic.is_none() {
            return ForecastResult::unknown();
        }

        let speed = plasma.and_then(|p| p.speed);
        let density = plasma.and_then(|p| p.density);
        let bz_gsm = magnetic.and_then(|m| m.bz_gsm);

        let level = self.classify(bz_gsm.unwrap_or(0.0), speed.unwrap_or(0.0));
        debug!(?bz_gsm, ?speed, ?density, %level, "Forecast evaluated");

        ForecastResult {
            level,
            message: level.message(),
            bz_gsm: Measurement::new(bz_gsm, Unit::Nanotesla),
            speed: Measurement::new(speed, Unit::KilometersPerSecond),
            density: Measurement::new(density, Unit::ParticlesPerCubicCentimeter),
        }
    }

    /// Apply the ordered rules to concrete values
    pub fn classify(&self, bz_gsm: f64, speed: f64) -> ForecastLevel {
        let t = &self.thresholds;
        if bz_gsm < t.high_bz_nt && speed > t.high_speed_kms {
            ForecastLevel::High
        } else if bz_gsm < t.moderate_bz_nt && speed > t.moderate_speed_kms {
            ForecastLevel::Moderate
        } else {
            ForecastLevel::Low
        }
    }
}
