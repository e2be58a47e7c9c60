//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! collection cycle statistics as a plain-text table.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_memory_collector::CycleStats;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-memory-collector — More info: https://www.herakles.now — Support: exporter@herakles.now";

/// HTTP status and heading derived from the latest cycle.
fn health_status(enabled: bool, stats: &CycleStats) -> (StatusCode, &'static str) {
    if !enabled {
        (StatusCode::OK, "OK - Collection disabled")
    } else if stats.last_cycle_ok() {
        (StatusCode::OK, "OK")
    } else if stats.last_cycle_failed() {
        (StatusCode::SERVICE_UNAVAILABLE, "Last collection cycle failed")
    } else if stats.last_cycle_time_is_set() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Last collection cycle produced no data",
        )
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "No collection cycle yet")
    }
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let (status, message) = health_status(state.config.is_enabled(), &state.stats);

    // Calculate uptime
    let uptime_seconds = state.stats.get_uptime_seconds();
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let table = state.stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}\n{FOOTER_TEXT}"),
    )
}
