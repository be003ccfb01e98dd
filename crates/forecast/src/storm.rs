//! Geomagnetic Storm Classifier

use serde::{Deserialize, Serialize};

/// Kp-index at or above which a geomagnetic storm is recorded (G1 and up)
pub const STORM_KP_THRESHOLD: f64 = 5.0;

/// Storm classifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StormConfig {
    /// Kp threshold, inclusive
    pub kp_threshold: f64,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            kp_threshold: STORM_KP_THRESHOLD,
        }
    }
}

/// Decides whether a Kp-index value constitutes a storm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StormClassifier {
    threshold: f64,
}

impl StormClassifier {
    /// Create a classifier with the given inclusive threshold
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Create a classifier from configuration
    pub fn from_config(config: &StormConfig) -> Self {
        Self::new(config.kp_threshold)
    }

    /// Configured threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True when `kp` meets the threshold. NaN is never a storm.
    pub fn is_storm(&self, kp: f64) -> bool {
        kp >= self.threshold
    }
}

impl Default for StormClassifier {
    fn default() -> Self {
        Self::new(STORM_KP_THRESHOLD)
    }
}
