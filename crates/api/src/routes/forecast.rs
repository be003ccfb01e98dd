//! Forecast Routes

use axum::{extract::State, Json};
use pipeline::ForecastReport;
use std::sync::Arc;

use crate::AppState;

/// Compute the aurora forecast from the live feeds
///
/// Always answers 200; unreachable feeds show up under `issues`.
pub async fn get_forecast(State(state): State<Arc<AppState>>) -> Json<ForecastReport> {
    Json(state.forecast.current_forecast().await)
}
