#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the apprehension dashboard.
//!
//! Owns the session's record set. The source is loaded exactly once, in the
//! background, right after startup; until it finishes every data endpoint
//! answers `503`, and if it fails they answer `500` with a fixed message for
//! the rest of the process lifetime. Dashboard views are recomputed from the
//! in-memory records on every request.

mod handlers;

use std::future::Future;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use aprehensys_ai::InsightOptions;
use aprehensys_ai::providers::LlmProvider;
use aprehensys_analytics_models::MapDefaults;
use aprehensys_apprehension_models::Apprehension;
use aprehensys_source::SourceError;
use aprehensys_source::normalize::Normalized;
use aprehensys_source::source_def::SourceDefinition;
use tokio::sync::{Mutex, RwLock};

/// Message shown to clients when the one-shot load failed. The underlying
/// cause is only logged.
pub const LOAD_FAILED_MESSAGE: &str = "No se pudieron cargar los datos de aprehensiones.";

/// Lifecycle of the session's record set.
#[derive(Debug, Clone)]
pub enum DatasetState {
    /// The load has not finished yet.
    Loading,
    /// The load succeeded.
    Ready {
        /// Admitted records, in source order.
        records: Arc<Vec<Apprehension>>,
        /// Rows dropped by admission.
        rejected: usize,
    },
    /// The load failed. There is no retry.
    Failed,
}

/// Shared application state.
pub struct AppState {
    /// The session's record set.
    pub dataset: RwLock<DatasetState>,
    /// Map viewport constants.
    pub map_defaults: MapDefaults,
    /// Insight sampling and language.
    pub insight_options: InsightOptions,
    /// Configured LLM provider, if any.
    pub provider: Option<Box<dyn LlmProvider>>,
    /// Held while an insight request is outstanding.
    pub insight_lock: Mutex<()>,
}

impl AppState {
    /// Creates state in the [`DatasetState::Loading`] state.
    #[must_use]
    pub fn new(provider: Option<Box<dyn LlmProvider>>) -> Self {
        Self {
            dataset: RwLock::new(DatasetState::Loading),
            map_defaults: MapDefaults::default(),
            insight_options: InsightOptions::default(),
            provider,
            insight_lock: Mutex::new(()),
        }
    }

    /// Records the outcome of the one-shot load.
    pub async fn finish_load(&self, result: Result<Normalized, SourceError>) {
        let next = match result {
            Ok(normalized) => {
                log::info!(
                    "Dataset ready: {} records ({} rejected)",
                    normalized.records.len(),
                    normalized.rejections.len()
                );
                DatasetState::Ready {
                    rejected: normalized.rejections.len(),
                    records: Arc::new(normalized.records),
                }
            }
            Err(e) => {
                log::error!("Failed to load apprehension data: {e}");
                DatasetState::Failed
            }
        };
        *self.dataset.write().await = next;
    }
}

/// Downloads and normalizes `definition` into `state`.
pub async fn load_dataset(state: &AppState, definition: SourceDefinition) {
    log::info!("Loading apprehension data from source '{}'...", definition.id);
    supervise_load(state, async move { aprehensys_source::load(&definition).await }).await;
}

/// Runs `load` on its own task and records its outcome in `state`.
///
/// A load task that panics or is cancelled leaves the dataset
/// [`DatasetState::Failed`], never [`DatasetState::Loading`].
pub async fn supervise_load<F>(state: &AppState, load: F)
where
    F: Future<Output = Result<Normalized, SourceError>> + Send + 'static,
{
    match tokio::spawn(load).await {
        Ok(result) => state.finish_load(result).await,
        Err(e) => {
            log::error!("Apprehension load task aborted: {e}");
            *state.dataset.write().await = DatasetState::Failed;
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/status", web::get().to(handlers::status))
            .route("/apprehensions", web::get().to(handlers::apprehensions))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route("/filters", web::get().to(handlers::filters))
            .route("/insights", web::post().to(handlers::insights)),
    );
}

/// Starts the apprehension dashboard API server.
///
/// Creates the LLM provider from the environment (insights are disabled if
/// none is configured), spawns the one-shot load of `definition`, and
/// serves on `BIND_ADDR`:`PORT` (default `127.0.0.1:8080`). The caller
/// initializes logging and provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server(definition: SourceDefinition) -> std::io::Result<()> {
    let provider = match aprehensys_ai::providers::create_provider_from_env() {
        Ok(provider) => Some(provider),
        Err(e) => {
            log::warn!("AI insights disabled: {e}");
            None
        }
    };

    let state = web::Data::new(AppState::new(provider));

    let loader = state.clone();
    tokio::spawn(async move {
        load_dataset(&loader, definition).await;
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
