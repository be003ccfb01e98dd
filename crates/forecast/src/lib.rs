//! Storm Classification and Aurora Forecasting
//!
//! Fixed-threshold rules over the latest space-weather readings:
//! - Kp-index storm detection
//! - Aurora visibility levels from solar wind and IMF Bz

mod aurora;
mod storm;

pub use aurora::{
    ForecastEngine, ForecastLevel, ForecastResult, ForecastThresholds, MagneticSample,
    Measurement, PlasmaSample, Unit, HIGH_MESSAGE, LOW_MESSAGE, MODERATE_MESSAGE,
    UNKNOWN_MESSAGE,
};
pub use storm::{StormClassifier, StormConfig, STORM_KP_THRESHOLD};
