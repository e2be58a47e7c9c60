//! Herakles Memory Collector Library
//!
//! This library reads system memory counters, selects the ones worth
//! reporting, converts them to a configured binary unit and publishes them as
//! gauges. It is framework-agnostic: the sink is a small trait, so the same
//! collection cycle can feed a Prometheus registry, a test recorder or any
//! other backend.
//!
//! # Sources
//!
//! - **Primary**: `/proc/meminfo`, parsed line by line. Malformed lines are skipped.
//! - **Fallback**: `sysinfo(2)`, used only when the primary source is not readable.
//!   It reports `MemTotal`, `MemFree`, `SwapTotal` and `SwapFree`.
//!
//! When neither source is usable a cycle returns [`CycleOutcome::NoData`].
//!
//! # Usage
//!
//! ```rust
//! use herakles_memory_collector::{MemoryCollector, RecordingEmitter, RuntimeConfig};
//!
//! let collector = MemoryCollector::new();
//! let config = RuntimeConfig::from_unit_names(false, &["kilobyte"]).unwrap();
//! let emitter = RecordingEmitter::new();
//!
//! match collector.collect(&config, &emitter) {
//!     Ok(outcome) => {
//!         for metric in emitter.metrics() {
//!             println!("{} = {} {}", metric.name, metric.value, metric.unit);
//!         }
//!         println!("no data: {}", outcome.is_no_data());
//!     }
//!     Err(e) => eprintln!("collection failed: {}", e),
//! }
//! ```

pub mod collector;
pub mod collectors;
pub mod emitter;
pub mod health_stats;
pub mod units;

// Re-export main types for convenience
pub use collector::{
    ActiveSource, CollectError, CycleOutcome, CycleReport, MemoryCollector, RuntimeConfig,
    SourceKind,
};
pub use emitter::{CanonicalMetric, Emitter, MetricKind, PrometheusEmitter, RecordingEmitter};
pub use health_stats::CycleStats;
pub use units::{convert, UnitError, UnitSymbol};
