//! Storm Check Routes

use axum::{extract::State, Json};
use pipeline::IngestOutcome;
use std::sync::Arc;

use crate::{error::ApiError, AppState};

/// Run one storm ingestion pass on demand
pub async fn check_now(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let outcome = state.storm_check.run().await?;
    Ok(Json(outcome))
}
