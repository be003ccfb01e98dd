//! Storm Ingestion
//!
//! One batch pass: fetch the Kp feed, select the latest observed reading,
//! classify it and record a storm event unless one already exists.

use crate::config::FeedEndpoint;
use chrono::{DateTime, Utc};
use feed_client::{FeedError, FeedReader};
use forecast::StormClassifier;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use storage::{EventAttributes, EventStore, EventType, StormEvent, StorageError};
use telemetry::{fields, select_latest, InsufficientData, Selection};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that abort a storm check
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configured schema has no Kp column
    #[error("Kp feed schema has no {0} field")]
    MissingField(&'static str),
}

/// The Kp sample a check was based on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpObservation {
    pub timestamp: DateTime<Utc>,
    pub kp_index: f64,
    /// A predicted value was used because no observed one existed
    pub degraded: bool,
}

/// Result of one storm check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Feed reachable but held no usable rows
    NoData { reason: InsufficientData },
    /// Latest Kp is below the storm threshold
    NoStorm { observation: KpObservation },
    /// A new storm event was recorded
    Created {
        observation: KpObservation,
        event: StormEvent,
    },
    /// The storm was already on record
    AlreadyRecorded {
        observation: KpObservation,
        event: StormEvent,
    },
}

impl IngestOutcome {
    /// Stable label, also used as a metrics label
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::NoData { .. } => "no_data",
            IngestOutcome::NoStorm { .. } => "no_storm",
            IngestOutcome::Created { .. } => "created",
            IngestOutcome::AlreadyRecorded { .. } => "already_recorded",
        }
    }
}

/// Storm ingestion batch
pub struct StormCheck<S> {
    reader: FeedReader,
    feed: FeedEndpoint,
    classifier: StormClassifier,
    store: Arc<S>,
}

impl<S: EventStore> StormCheck<S> {
    pub fn new(
        reader: FeedReader,
        feed: FeedEndpoint,
        classifier: StormClassifier,
        store: Arc<S>,
    ) -> Self {
        Self {
            reader,
            feed,
            classifier,
            store,
        }
    }

    /// Check the Kp feed once and record a storm if one is detected
    pub async fn run(&self) -> Result<IngestOutcome, IngestError> {
        info!(url = %self.feed.url, "Fetching latest Kp-index");

        let outcome = self.check().await;
        match &outcome {
            Ok(outcome) => {
                counter!("aurora_storm_checks_total", "outcome" => outcome.label()).increment(1);
            }
            Err(e) => {
                error!(error = %e, "Storm check failed");
                counter!("aurora_storm_checks_total", "outcome" => "error").increment(1);
            }
        }
        outcome
    }

    async fn check(&self) -> Result<IngestOutcome, IngestError> {
        let rows = self.reader.fetch_rows(&self.feed.url).await.map_err(|e| {
            counter!("aurora_feed_failures_total", "feed" => "kp").increment(1);
            e
        })?;

        let selected = match select_latest(&rows, &self.feed.schema) {
            Selection::Selected(selected) => selected,
            Selection::InsufficientData(reason) => {
                warn!(%reason, "No Kp-index data returned");
                return Ok(IngestOutcome::NoData { reason });
            }
        };

        let kp_index = selected
            .reading
            .value(fields::KP_INDEX)
            .ok_or(IngestError::MissingField(fields::KP_INDEX))?;

        let observation = KpObservation {
            timestamp: selected.reading.timestamp,
            kp_index,
            degraded: selected.degraded,
        };

        info!(
            kp_index,
            timestamp = %observation.timestamp,
            degraded = observation.degraded,
            "Latest Kp-index reading"
        );

        if !self.classifier.is_storm(kp_index) {
            info!("Conditions are calm, no new event created");
            return Ok(IngestOutcome::NoStorm { observation });
        }

        info!(kp_index, threshold = self.classifier.threshold(), "Storm detected");

        let attributes = EventAttributes {
            max_kp_index: Some(kp_index),
            ..Default::default()
        };
        let (event, created) = self
            .store
            .ensure_event(EventType::GeomagneticStorm, observation.timestamp, attributes)
            .await?;

        if created {
            info!(event_id = event.id, "Created new storm event");
            Ok(IngestOutcome::Created { observation, event })
        } else {
            warn!(event_id = event.id, "An event for this time already exists");
            Ok(IngestOutcome::AlreadyRecorded { observation, event })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{reader, serve};
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use storage::MemoryEventStore;
    use telemetry::FeedSchema;

    fn kp_feed(rows: Value) -> Router {
        Router::new().route("/kp.json", get(move || async move { Json(rows.clone()) }))
    }

    fn header() -> Value {
        json!(["time_tag", "Kp", "a_running", "station_count", "source"])
    }

    async fn check_against(app: Router, store: Arc<MemoryEventStore>) -> StormCheck<MemoryEventStore> {
        let base = serve(app).await;
        StormCheck::new(
            reader(),
            FeedEndpoint::new(format!("{}/kp.json", base), FeedSchema::kp_index()),
            StormClassifier::default(),
            store,
        )
    }

    #[tokio::test]
    async fn test_storm_ingestion_is_idempotent() {
        let rows = json!([
            header(),
            ["2024-05-10T15:00:00Z", "7.33", 111, 8, "observed"],
            ["2024-05-10T18:00:00Z", "8.67", 207, 8, "observed"],
            ["2024-05-10T21:00:00Z", "9.00", 300, 0, "predicted"],
        ]);
        let store = Arc::new(MemoryEventStore::new());
        let check = check_against(kp_feed(rows), store.clone()).await;

        let first = check.run().await.unwrap();
        let second = check.run().await.unwrap();

        match first {
            IngestOutcome::Created { event, observation } => {
                assert_eq!(observation.kp_index, 8.67);
                assert!(!observation.degraded);
                assert_eq!(event.max_kp_index, Some(8.67));
                assert_eq!(event.start_time.to_rfc3339(), "2024-05-10T18:00:00+00:00");
            }
            other => panic!("expected Created, got {:?}", other),
        }
        assert_eq!(second.label(), "already_recorded");
        assert_eq!(store.event_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_calm_conditions_create_nothing() {
        let rows = json!([header(), ["2024-05-10T18:00:00Z", "4.99", 27, 8, "observed"]]);
        let store = Arc::new(MemoryEventStore::new());
        let check = check_against(kp_feed(rows), store.clone()).await;

        let outcome = check.run().await.unwrap();

        assert_eq!(outcome.label(), "no_storm");
        assert_eq!(store.event_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_predicted_fallback_still_records() {
        let rows = json!([header(), ["2024-05-10T18:00:00Z", "5.00", 48, 0, "predicted"]]);
        let store = Arc::new(MemoryEventStore::new());
        let check = check_against(kp_feed(rows), store.clone()).await;

        match check.run().await.unwrap() {
            IngestOutcome::Created { observation, .. } => assert!(observation.degraded),
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_header_only_feed_is_no_data() {
        let store = Arc::new(MemoryEventStore::new());
        let check = check_against(kp_feed(json!([header()])), store).await;

        assert_eq!(
            check.run().await.unwrap(),
            IngestOutcome::NoData {
                reason: InsufficientData::HeaderOnly
            }
        );
    }

    #[tokio::test]
    async fn test_feed_failure_is_reported() {
        let app = Router::new().route(
            "/kp.json",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let store = Arc::new(MemoryEventStore::new());
        let check = check_against(app, store).await;

        assert!(matches!(check.run().await, Err(IngestError::Feed(_))));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = IngestOutcome::NoData {
            reason: InsufficientData::EmptyFeed,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["reason"], "empty_feed");
    }
}
