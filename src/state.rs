//! Application state management for the collector server.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use herakles_memory_collector::{CycleStats, MemoryCollector, RuntimeConfig};
use prometheus::Registry;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::Config;
use crate::metrics::ExportedMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub metrics: ExportedMetrics,
    pub collector: MemoryCollector,
    /// Validated once at startup; read-only afterwards.
    pub runtime_config: RuntimeConfig,
    pub config: Arc<Config>,
    pub stats: Arc<CycleStats>,
    /// Held for a whole scrape: reset, collect and gather of the memory family.
    pub scrape_lock: Mutex<()>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
