//! Prometheus self-telemetry for herakles-memory-collector.
//!
//! The memory counters themselves live in the `PrometheusEmitter` gauge family.
//! This module only describes how the collector itself is doing.

use herakles_memory_collector::{CycleOutcome, PrometheusEmitter, SourceKind};
use prometheus::{Gauge, GaugeVec, Opts, Registry};

/// Label value of the source gauge when no source served the cycle.
pub const SOURCE_NONE: &str = "none";

/// Gauges describing the last collection cycle.
#[derive(Clone)]
pub struct CollectorMetrics {
    pub cycle_duration_seconds: Gauge,
    pub last_cycle_success: Gauge,
    pub source: GaugeVec, // labels: source
}

impl CollectorMetrics {
    /// Creates and registers all self-telemetry gauges.
    pub fn new(registry: &Registry, prefix: &str) -> Result<Self, prometheus::Error> {
        let cycle_duration_seconds = Gauge::new(
            format!("{}_collector_cycle_duration_seconds", prefix),
            "Time spent in the last memory collection cycle",
        )?;
        let last_cycle_success = Gauge::new(
            format!("{}_collector_last_cycle_success", prefix),
            "Whether the last cycle produced data (1) or not (0)",
        )?;
        let source = GaugeVec::new(
            Opts::new(
                format!("{}_collector_source", prefix),
                "Source that served the last cycle (1 for the active one)",
            ),
            &["source"],
        )?;

        registry.register(Box::new(cycle_duration_seconds.clone()))?;
        registry.register(Box::new(last_cycle_success.clone()))?;
        registry.register(Box::new(source.clone()))?;

        Ok(Self {
            cycle_duration_seconds,
            last_cycle_success,
            source,
        })
    }

    /// Updates the gauges after a cycle. `None` stands for a failed cycle.
    pub fn observe(&self, outcome: Option<&CycleOutcome>, duration_seconds: f64) {
        self.cycle_duration_seconds.set(duration_seconds);

        let active = match outcome {
            Some(CycleOutcome::Collected(report)) => report.source.as_str(),
            _ => SOURCE_NONE,
        };
        for label in [
            SourceKind::Procfs.as_str(),
            SourceKind::Sysinfo.as_str(),
            SOURCE_NONE,
        ] {
            let value = if label == active { 1.0 } else { 0.0 };
            self.source.with_label_values(&[label]).set(value);
        }

        let success = matches!(outcome, Some(CycleOutcome::Collected(_)));
        self.last_cycle_success.set(if success { 1.0 } else { 0.0 });
    }
}

/// Everything registered for one server instance.
pub struct ExportedMetrics {
    pub values: PrometheusEmitter,
    pub collector: CollectorMetrics,
}

impl ExportedMetrics {
    pub fn new(registry: &Registry, prefix: &str) -> Result<Self, prometheus::Error> {
        Ok(Self {
            values: PrometheusEmitter::new(registry, prefix)?,
            collector: CollectorMetrics::new(registry, prefix)?,
        })
    }
}
