//! Coronal Mass Ejection Alert Feed
//!
//! Reads the DONKI CME feed over a rolling window ending now and normalizes
//! each alert for display. CME data is supplementary: `fetch_recent` never
//! propagates a failure, it yields an empty list instead.

use crate::error::FeedError;
use crate::reader::FeedReader;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Default DONKI CME endpoint
pub const DEFAULT_CME_URL: &str = "https://api.nasa.gov/DONKI/CME";

/// Credential accepted by api.nasa.gov for low-volume use
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";

/// Default look-back window in days
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Note shown when an alert carries none
pub const NOTE_PLACEHOLDER: &str = "No description available.";

/// Display format for alert timestamps
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// CME feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmeFeedConfig {
    /// Feed endpoint
    pub url: String,
    /// Access credential sent as `api_key`
    pub api_key: String,
    /// Window length in days
    pub window_days: i64,
}

impl Default for CmeFeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CME_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// A single CME alert ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmeAlert {
    /// When the ejection started
    pub occurred_at: DateTime<Utc>,
    /// `occurred_at` rendered with `DISPLAY_FORMAT`
    pub display_time: String,
    /// Upstream note, or `NOTE_PLACEHOLDER`
    pub note: String,
}

/// Reader for the CME alert feed
#[derive(Debug, Clone)]
pub struct CmeFeed {
    reader: FeedReader,
    config: CmeFeedConfig,
}

impl CmeFeed {
    /// Create a CME feed adapter
    pub fn new(reader: FeedReader, config: CmeFeedConfig) -> Self {
        Self { reader, config }
    }

    /// Query window `[now - window_days, now]` as calendar dates
    ///
    /// `window_days` must be at least 1 and small enough to stay within the
    /// representable date range.
    pub fn window(&self, now: DateTime<Utc>) -> Result<(NaiveDate, NaiveDate), FeedError> {
        let days = self.config.window_days;
        let start = Some(days)
            .filter(|d| *d >= 1)
            .and_then(Duration::try_days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or(FeedError::InvalidWindow(days))?;
        Ok((start.date_naive(), now.date_naive()))
    }

    /// Fetch alerts for the window ending at `now`
    pub async fn try_fetch(&self, now: DateTime<Utc>) -> Result<Vec<CmeAlert>, FeedError> {
        let (start, end) = self.window(now)?;
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();

        let items = self
            .reader
            .fetch_rows_with_query(
                &self.config.url,
                &[
                    ("startDate", start_date.as_str()),
                    ("endDate", end_date.as_str()),
                    ("api_key", self.config.api_key.as_str()),
                ],
            )
            .await?;

        let alerts = normalize_alerts(&items);
        debug!(
            received = items.len(),
            kept = alerts.len(),
            "CME alerts normalized"
        );
        Ok(alerts)
    }

    /// Fetch alerts for the window ending now, degrading failures to no alerts
    pub async fn fetch_recent(&self) -> Vec<CmeAlert> {
        match self.try_fetch(Utc::now()).await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(error = %e, "CME feed unavailable, continuing without alerts");
                Vec::new()
            }
        }
    }
}

/// Normalize raw feed items, dropping those without a usable `startTime`
pub fn normalize_alerts(items: &[Value]) -> Vec<CmeAlert> {
    items.iter().filter_map(normalize_alert).collect()
}

fn normalize_alert(item: &Value) -> Option<CmeAlert> {
    let occurred_at = item
        .get("startTime")
        .and_then(Value::as_str)
        .and_then(parse_start_time)?;

    let note = item
        .get("note")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(NOTE_PLACEHOLDER)
        .to_string();

    Some(CmeAlert {
        occurred_at,
        display_time: occurred_at.format(DISPLAY_FORMAT).to_string(),
        note,
    })
}

/// Parse DONKI start times such as `2024-05-10T17:36Z`
fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let trimmed = raw.strip_suffix('Z').unwrap_or(raw);
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::serve;
    use axum::{extract::Query, http::StatusCode, routing::get, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn feed(base: &str) -> CmeFeed {
        feed_with_window(base, 7)
    }

    fn feed_with_window(base: &str, window_days: i64) -> CmeFeed {
        let reader =
            FeedReader::with_timeout("aurora-watch-test", std::time::Duration::from_secs(5))
                .unwrap();
        CmeFeed::new(
            reader,
            CmeFeedConfig {
                url: format!("{}/DONKI/CME", base),
                api_key: "TEST_KEY".to_string(),
                window_days,
            },
        )
    }

    #[test]
    fn test_normalize_drops_items_without_start_time() {
        let items = vec![
            json!({"startTime": "2024-05-10T17:36Z", "note": "Halo CME"}),
            json!({"note": "no start"}),
            json!({"startTime": "yesterday", "note": "bad start"}),
            json!({"startTime": null}),
        ];

        let alerts = normalize_alerts(&items);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].note, "Halo CME");
        assert_eq!(alerts[0].display_time, "2024-05-10 17:36 UTC");
    }

    #[test]
    fn test_missing_note_uses_placeholder() {
        let items = vec![
            json!({"startTime": "2024-05-08T05:36Z"}),
            json!({"startTime": "2024-05-09T09:24:00Z", "note": null}),
        ];

        let alerts = normalize_alerts(&items);

        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.note == NOTE_PLACEHOLDER));
    }

    #[test]
    fn test_upstream_order_preserved() {
        let items = vec![
            json!({"startTime": "2024-05-09T09:24Z", "note": "second"}),
            json!({"startTime": "2024-05-08T05:36Z", "note": "first"}),
        ];

        let notes: Vec<_> = normalize_alerts(&items).into_iter().map(|a| a.note).collect();
        assert_eq!(notes, vec!["second", "first"]);
    }

    #[test]
    fn test_window_spans_seven_days() {
        let feed = feed("http://localhost");
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 1, 30, 0).unwrap();

        let (start, end) = feed.window(now).unwrap();

        assert_eq!(start.to_string(), "2024-05-03");
        assert_eq!(end.to_string(), "2024-05-10");
    }

    #[tokio::test]
    async fn test_try_fetch_sends_window_and_key() {
        let app = Router::new().route(
            "/DONKI/CME",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let note = format!(
                    "{}..{} {}",
                    params.get("startDate").cloned().unwrap_or_default(),
                    params.get("endDate").cloned().unwrap_or_default(),
                    params.get("api_key").cloned().unwrap_or_default()
                );
                axum::Json(json!([{"startTime": "2024-05-09T09:24Z", "note": note}]))
            }),
        );
        let base = serve(app).await;
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();

        let alerts = feed(&base).try_fetch(now).await.unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].note, "2024-05-03..2024-05-10 TEST_KEY");
    }

    #[tokio::test]
    async fn test_fetch_recent_degrades_to_empty() {
        let app = Router::new().route(
            "/DONKI/CME",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base = serve(app).await;

        let alerts = feed(&base).fetch_recent().await;

        assert!(alerts.is_empty());
    }

    #[test]
    fn test_window_rejects_unusable_lengths() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();

        for days in [0, -3, 1_000_000_000, i64::MAX] {
            let err = feed_with_window("http://localhost", days)
                .window(now)
                .unwrap_err();
            assert!(matches!(err, FeedError::InvalidWindow(d) if d == days));
        }
    }

    #[tokio::test]
    async fn test_oversized_window_degrades_to_empty() {
        let app = Router::new().route(
            "/DONKI/CME",
            get(|| async { axum::Json(json!([{"startTime": "2024-05-09T09:24Z"}])) }),
        );
        let base = serve(app).await;
        let feed = feed_with_window(&base, 1_000_000_000);
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();

        assert!(matches!(
            feed.try_fetch(now).await,
            Err(FeedError::InvalidWindow(_))
        ));
        assert!(feed.fetch_recent().await.is_empty());
    }
}
