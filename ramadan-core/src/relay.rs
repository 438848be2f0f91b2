//! HTTP surface of the relay: routes, shared state and CORS.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderValue,
    routing::get,
};
use std::{future::Future, io, sync::Arc};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    Config,
    calendar::to_calendar,
    error::{RelayError, RelayResult},
    model::{CalendarEntry, Coordinate, RootMessage},
    provider::{RamadanProvider, provider_from_config},
};

/// State shared by all handlers. Immutable for the life of the process.
#[derive(Debug, Clone)]
pub struct AppState {
    provider: Option<Arc<dyn RamadanProvider>>,
}

impl AppState {
    pub fn new(provider: Option<Arc<dyn RamadanProvider>>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(provider_from_config(config)?))
    }
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ramadan", get(ramadan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Exact-match origin allow-list; methods and headers are mirrored from
/// the preflight so any of them is accepted alongside credentials.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Run the relay until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    if state.provider.is_none() {
        tracing::warn!("ISLAMIC_API_KEY is not set; /ramadan will answer 500 until it is configured");
    }

    let app = router(state, cors_layer(&config.allowed_origins)?);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        origins = ?config.allowed_origins,
        timeout_secs = config.request_timeout_secs,
        "Ramadan relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Ramadan relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A listener that fails to install never
/// resolves, so the server keeps running instead of stopping right away.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {err}; running until killed");
        std::future::pending::<()>().await;
    }
}

async fn root() -> Json<RootMessage> {
    Json(RootMessage::default())
}

async fn ramadan(
    State(state): State<AppState>,
    query: Result<Query<Coordinate>, QueryRejection>,
) -> RelayResult<Json<Vec<CalendarEntry>>> {
    let Query(coordinate) = query?;
    let provider = state.provider.as_ref().ok_or(RelayError::MissingApiKey)?;

    let days = provider.fasting_days(&coordinate).await?;
    tracing::info!(lat = %coordinate.lat, lon = %coordinate.lon, days = days.len(), "Served Ramadan calendar");

    Ok(Json(to_calendar(days)))
}
