//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every scrape runs one collection cycle into the registry's memory gauge
//! family and then encodes the whole registry in Prometheus text format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_memory_collector::CollectError;
use prometheus::{Encoder, TextEncoder};
use std::sync::PoisonError;
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::{AppState, SharedState};

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    CycleFailed(String),
    EncodingFailed,
}

impl From<CollectError> for MetricsError {
    fn from(e: CollectError) -> Self {
        MetricsError::CycleFailed(e.to_string())
    }
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let body = match self {
            MetricsError::CycleFailed(msg) => format!("Memory collection failed: {}", msg),
            MetricsError::EncodingFailed => "Failed to encode metrics".to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");

    let scrape_state = state.clone();
    let body = tokio::task::spawn_blocking(move || scrape(&scrape_state))
        .await
        .map_err(|e| {
            error!("Scrape task aborted: {}", e);
            MetricsError::CycleFailed(e.to_string())
        })??;

    debug!(
        "Metrics request completed: {} bytes, {:.3}ms",
        body.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(body)
}

/// Collects and encodes one scrape.
///
/// Reset, collection and gathering share one gauge family, so the whole
/// sequence runs under `scrape_lock`.
pub fn scrape(state: &AppState) -> Result<String, MetricsError> {
    let _guard = state
        .scrape_lock
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if state.config.is_enabled() {
        run_cycle(state)?;
    } else {
        debug!("Collection disabled, serving self-telemetry only");
    }

    let families = state.registry.gather();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if encoder.encode(&families, &mut buffer).is_err() {
        error!("Failed to encode Prometheus metrics");
        return Err(MetricsError::EncodingFailed);
    }

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}

/// Runs one cycle and records its outcome.
fn run_cycle(state: &AppState) -> Result<(), MetricsError> {
    let start = Instant::now();

    // Counters missing from this cycle must not linger from the previous one.
    state.metrics.values.reset();
    let result = state
        .collector
        .collect(&state.runtime_config, &state.metrics.values);
    let duration = start.elapsed().as_secs_f64();

    match result {
        Ok(outcome) => {
            if outcome.is_no_data() {
                error!("No memory source available, cycle produced no data");
            }
            state.stats.record_cycle(Some(&outcome), duration);
            state.metrics.collector.observe(Some(&outcome), duration);
            Ok(())
        }
        Err(e) => {
            error!("Memory collection cycle failed: {}", e);
            state.stats.record_cycle(None, duration);
            state.metrics.collector.observe(None, duration);
            Err(e.into())
        }
    }
}
