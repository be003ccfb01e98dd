//! Aurora Watch API Server
//!
//! REST API over the storm event archive and the live aurora forecast,
//! plus the one-shot storm ingestion batch used by the CLI.

use axum::{
    routing::{get, post},
    Router,
};
use feed_client::{CmeFeed, FeedError, FeedReader};
use forecast::{ForecastEngine, StormClassifier};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pipeline::{ForecastService, IngestError, StormCheck};
use std::sync::Arc;
use std::time::Instant;
use storage::SqliteEventStore;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
mod error;
mod routes;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    /// Event archive
    pub store: Arc<SqliteEventStore>,
    /// On-demand storm ingestion
    pub storm_check: StormCheck<SqliteEventStore>,
    /// Forecast computation
    pub forecast: ForecastService,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus exporter, when installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the services described by `config` around an open store
    pub fn new(
        config: &AppConfig,
        store: Arc<SqliteEventStore>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, FeedError> {
        let reader = FeedReader::new(&config.feeds.reader_config())?;

        Ok(Self {
            storm_check: storm_check(config, reader.clone(), store.clone()),
            forecast: ForecastService::new(
                reader.clone(),
                config.feeds.plasma.clone(),
                config.feeds.magnetic.clone(),
                CmeFeed::new(reader, config.cme.clone()),
                ForecastEngine::new(config.forecast),
            ),
            store,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        })
    }
}

fn storm_check(
    config: &AppConfig,
    reader: FeedReader,
    store: Arc<SqliteEventStore>,
) -> StormCheck<SqliteEventStore> {
    StormCheck::new(
        reader,
        config.feeds.kp.clone(),
        StormClassifier::from_config(&config.storm),
        store,
    )
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health_handler))
        .route("/api/v1/forecast", get(routes::forecast::get_forecast))
        .route("/api/v1/storms/check", post(routes::storms::check_now))
        .route("/api/v1/events", get(routes::events::list_events))
        .route("/api/v1/events/:id", get(routes::events::get_event))
        .route(
            "/api/v1/events/:id/stories",
            post(routes::events::create_story),
        )
        .route("/metrics", get(routes::health::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus exporter not installed");
            None
        }
    };

    let store = Arc::new(SqliteEventStore::connect(&config.database).await?);
    let state = Arc::new(AppState::new(&config, store, metrics)?);
    let app = create_router(state);

    info!("Starting API server on {}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Run one storm ingestion pass and print the outcome as JSON
///
/// Feed and storage failures are logged, not returned; only a database that
/// cannot be opened fails the call.
pub async fn fetch_events(config: &AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(SqliteEventStore::connect(&config.database).await?);
    let reader = FeedReader::new(&config.feeds.reader_config())?;
    let check = storm_check(config, reader, store);

    match check.run().await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Err(IngestError::Feed(e)) => {
            error!(error = %e, "Kp feed unavailable, nothing recorded");
        }
        Err(e) => {
            error!(error = %e, "Storm check aborted");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
