//! Aurora Forecast Service
//!
//! Fetches the plasma, magnetic-field and CME feeds concurrently, then runs
//! the forecast rules on whatever was obtained. A failing feed only removes
//! its own measurements; the failure is reported alongside the forecast.

use crate::config::FeedEndpoint;
use chrono::{DateTime, Utc};
use feed_client::{CmeAlert, CmeFeed, FeedReader};
use forecast::{ForecastEngine, ForecastResult, MagneticSample, PlasmaSample};
use metrics::counter;
use serde::Serialize;
use telemetry::{fields, select_latest, Reading, Selection};
use tracing::{info, warn};

/// A feed that contributed nothing to this forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedIssue {
    pub feed: &'static str,
    pub message: String,
}

/// Forecast plus supplementary CME alerts
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub generated_at: DateTime<Utc>,
    pub forecast: ForecastResult,
    pub cme_alerts: Vec<CmeAlert>,
    pub issues: Vec<FeedIssue>,
}

/// On-demand forecast computation
pub struct ForecastService {
    reader: FeedReader,
    plasma: FeedEndpoint,
    magnetic: FeedEndpoint,
    cme: CmeFeed,
    engine: ForecastEngine,
}

impl ForecastService {
    pub fn new(
        reader: FeedReader,
        plasma: FeedEndpoint,
        magnetic: FeedEndpoint,
        cme: CmeFeed,
        engine: ForecastEngine,
    ) -> Self {
        Self {
            reader,
            plasma,
            magnetic,
            cme,
            engine,
        }
    }

    /// Compute the current forecast
    pub async fn current_forecast(&self) -> ForecastReport {
        let now = Utc::now();
        let (plasma, magnetic, cme) = tokio::join!(
            self.latest_reading("plasma", &self.plasma),
            self.latest_reading("magnetic", &self.magnetic),
            self.cme.try_fetch(now),
        );

        let mut issues = Vec::new();

        let plasma = collect(plasma, &mut issues).map(|r| PlasmaSample {
            speed: r.value(fields::SPEED),
            density: r.value(fields::DENSITY),
        });
        let magnetic = collect(magnetic, &mut issues).map(|r| MagneticSample {
            bz_gsm: r.value(fields::BZ_GSM),
        });

        let cme_alerts = match cme {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(error = %e, "CME feed unavailable, continuing without alerts");
                counter!("aurora_feed_failures_total", "feed" => "cme").increment(1);
                issues.push(FeedIssue {
                    feed: "cme",
                    message: e.to_string(),
                });
                Vec::new()
            }
        };

        let forecast = self.engine.evaluate(plasma.as_ref(), magnetic.as_ref());
        counter!("aurora_forecasts_total", "level" => forecast.level.as_str()).increment(1);
        info!(
            level = %forecast.level,
            bz_gsm = %forecast.bz_gsm,
            speed = %forecast.speed,
            density = %forecast.density,
            cme_alerts = cme_alerts.len(),
            "Forecast computed"
        );

        ForecastReport {
            generated_at: now,
            forecast,
            cme_alerts,
            issues,
        }
    }

    async fn latest_reading(
        &self,
        feed: &'static str,
        endpoint: &FeedEndpoint,
    ) -> Result<Reading, FeedIssue> {
        let rows = self.reader.fetch_rows(&endpoint.url).await.map_err(|e| {
            warn!(feed, error = %e, "Feed unavailable");
            counter!("aurora_feed_failures_total", "feed" => feed).increment(1);
            FeedIssue {
                feed,
                message: e.to_string(),
            }
        })?;

        match select_latest(&rows, &endpoint.schema) {
            Selection::Selected(selected) => Ok(selected.reading),
            Selection::InsufficientData(reason) => {
                warn!(feed, %reason, "Feed returned no usable data");
                Err(FeedIssue {
                    feed,
                    message: reason.to_string(),
                })
            }
        }
    }
}

fn collect(result: Result<Reading, FeedIssue>, issues: &mut Vec<FeedIssue>) -> Option<Reading> {
    match result {
        Ok(reading) => Some(reading),
        Err(issue) => {
            issues.push(issue);
            None
        }
    }
}
