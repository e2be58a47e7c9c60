//! Metric sinks.
//!
//! The collector hands every converted counter to an [`Emitter`]. Two sinks
//! ship with the crate: [`PrometheusEmitter`] feeds a gauge family in a
//! Prometheus registry, [`RecordingEmitter`] keeps the metrics in memory for
//! the `collect` command and for tests.

use prometheus::{GaugeVec, Opts, Registry};
use serde::Serialize;
use std::sync::Mutex;

use crate::units::UnitSymbol;

/// Kind of a published metric. Memory counters are point-in-time readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricKind {
    Gauge,
}

/// A filtered, unit-converted counter ready for publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalMetric {
    pub name: String,
    pub value: f64,
    pub unit: UnitSymbol,
    pub kind: MetricKind,
}

impl CanonicalMetric {
    pub fn gauge(name: impl Into<String>, value: f64, unit: UnitSymbol) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            kind: MetricKind::Gauge,
        }
    }
}

/// Destination for collected metrics.
///
/// Publishing is fire-and-forget: a sink handles its own failures.
pub trait Emitter {
    fn publish(&self, metric: &CanonicalMetric);
}

/// Keeps every published metric in publication order.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    metrics: Mutex<Vec<CanonicalMetric>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn metrics(&self) -> Vec<CanonicalMetric> {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Value of the last metric published under `name`.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.metrics
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics()
            .into_iter()
            .map(|m| m.name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emitter for RecordingEmitter {
    fn publish(&self, metric: &CanonicalMetric) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.push(metric.clone());
        }
    }
}

/// Publishes counters into a `<prefix>_value{field, unit}` gauge family.
#[derive(Clone)]
pub struct PrometheusEmitter {
    values: GaugeVec,
}

impl PrometheusEmitter {
    /// Creates the gauge family and registers it with `registry`.
    pub fn new(registry: &Registry, prefix: &str) -> prometheus::Result<Self> {
        let values = GaugeVec::new(
            Opts::new(
                format!("{}_value", prefix),
                "Memory counter from /proc/meminfo or sysinfo(2), in the configured unit",
            ),
            &["field", "unit"],
        )?;
        registry.register(Box::new(values.clone()))?;
        Ok(Self { values })
    }

    /// Drops all series so counters missing from the next cycle disappear.
    pub fn reset(&self) {
        self.values.reset();
    }
}

impl Emitter for PrometheusEmitter {
    fn publish(&self, metric: &CanonicalMetric) {
        match metric.kind {
            MetricKind::Gauge => self
                .values
                .with_label_values(&[metric.name.as_str(), metric.unit.name()])
                .set(metric.value),
        }
    }
}
