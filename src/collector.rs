//! Memory collection cycle.
//!
//! One call to [`MemoryCollector::collect`] is one cycle:
//!
//! ```text
//! NoSource ──(meminfo readable)──> PrimaryActive ──> Done(Collected)
//!    │
//!    └──(sysinfo available)──────> FallbackActive ─> Done(Collected)
//!    │
//!    └──(neither)──────────────────────────────────> Done(NoData)
//! ```
//!
//! The primary path parses every line, applies the field filter and converts
//! each counter to the target unit. The fallback path reports its four fixed
//! counters unfiltered. Only the first configured unit is used as target;
//! the remaining entries of `byte_units` are ignored.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::collectors::filter::should_report;
use crate::collectors::meminfo::{parse_meminfo_line, PrimarySource, ProcMeminfo};
use crate::collectors::sysinfo::{FallbackSource, MemoryUsage, SysinfoMemory};
use crate::emitter::{CanonicalMetric, Emitter};
use crate::units::{convert, UnitError, UnitSymbol};

/// Per-cycle settings. Read-only while a cycle runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Report every meminfo counter instead of the well-known set.
    pub detailed: bool,
    /// Conversion targets; only the first one is applied.
    pub byte_units: Vec<UnitSymbol>,
}

impl RuntimeConfig {
    pub fn new(detailed: bool, byte_units: Vec<UnitSymbol>) -> Self {
        Self {
            detailed,
            byte_units,
        }
    }

    /// Builds a config from unit tokens such as `["kilobyte"]` or `["kB"]`.
    pub fn from_unit_names<S: AsRef<str>>(detailed: bool, units: &[S]) -> Result<Self, UnitError> {
        let byte_units = units
            .iter()
            .map(|u| u.as_ref().parse())
            .collect::<Result<Vec<UnitSymbol>, _>>()?;
        Ok(Self::new(detailed, byte_units))
    }

    pub fn target_unit(&self) -> Option<UnitSymbol> {
        self.byte_units.first().copied()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(false, vec![UnitSymbol::Byte])
    }
}

/// Source that served a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Procfs,
    Sysinfo,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Procfs => "procfs",
            SourceKind::Sysinfo => "sysinfo",
        }
    }
}

/// Raw data of the source chosen for this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSource {
    Primary(String),
    Fallback {
        physical: MemoryUsage,
        swap: MemoryUsage,
    },
}

/// Summary of a cycle that found a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub source: SourceKind,
    pub unit: UnitSymbol,
    pub emitted: usize,
    /// Parsed counters dropped by the field filter.
    pub filtered: usize,
    /// Lines the parser rejected.
    pub skipped: usize,
}

impl CycleReport {
    fn new(source: SourceKind, unit: UnitSymbol) -> Self {
        Self {
            source,
            unit,
            emitted: 0,
            filtered: 0,
            skipped: 0,
        }
    }
}

/// Result of a cycle that did not hit a precondition violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Collected(CycleReport),
    /// Neither the primary nor the fallback source was available.
    NoData,
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Collected(report) => Some(report),
            CycleOutcome::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, CycleOutcome::NoData)
    }
}

/// Errors that abort a cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    #[error("no target unit configured (byte_unit is empty)")]
    MissingTargetUnit,

    #[error("cannot convert counter '{field}': {source}")]
    Unit { field: String, source: UnitError },
}

/// Drives collection cycles over a primary and an optional fallback source.
#[derive(Debug, Clone)]
pub struct MemoryCollector<P = ProcMeminfo, F = SysinfoMemory> {
    primary: P,
    fallback: Option<F>,
}

impl MemoryCollector {
    /// Collector over `/proc/meminfo` with the sysinfo(2) fallback.
    pub fn new() -> Self {
        Self::with_sources(ProcMeminfo::default(), Some(SysinfoMemory::new()))
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PrimarySource, F: FallbackSource> MemoryCollector<P, F> {
    /// Passing `None` as fallback disables the second tier.
    pub fn with_sources(primary: P, fallback: Option<F>) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&F> {
        self.fallback.as_ref()
    }

    /// Probes the sources in order and returns the data of the first usable one.
    pub fn select_source(&self) -> Option<ActiveSource> {
        if self.primary.can_read() {
            match self.primary.read_all() {
                Ok(text) => return Some(ActiveSource::Primary(text)),
                Err(e) => warn!("Primary memory source readable but read failed: {}", e),
            }
        } else {
            debug!("Primary memory source not readable");
        }

        match &self.fallback {
            Some(fallback) => match fallback.snapshot() {
                Some((physical, swap)) => Some(ActiveSource::Fallback { physical, swap }),
                None => {
                    debug!("Fallback memory source not available");
                    None
                }
            },
            None => {
                debug!("Fallback memory source disabled");
                None
            }
        }
    }

    /// Runs one collection cycle, publishing every selected counter to `emitter`.
    pub fn collect(
        &self,
        config: &RuntimeConfig,
        emitter: &dyn Emitter,
    ) -> Result<CycleOutcome, CollectError> {
        let target = config.target_unit().ok_or(CollectError::MissingTargetUnit)?;

        let report = match self.select_source() {
            Some(ActiveSource::Primary(text)) => {
                debug!("Collecting from primary source, target unit {}", target);
                collect_primary(&text, config, target, emitter)?
            }
            Some(ActiveSource::Fallback { physical, swap }) => {
                debug!("Collecting from fallback source, target unit {}", target);
                collect_fallback(physical, swap, target, emitter)
            }
            None => {
                debug!("No memory source available");
                return Ok(CycleOutcome::NoData);
            }
        };

        debug!(
            "Cycle done: source={} emitted={} filtered={} skipped={}",
            report.source.as_str(),
            report.emitted,
            report.filtered,
            report.skipped
        );
        Ok(CycleOutcome::Collected(report))
    }
}

fn collect_primary(
    text: &str,
    config: &RuntimeConfig,
    target: UnitSymbol,
    emitter: &dyn Emitter,
) -> Result<CycleReport, CollectError> {
    let mut report = CycleReport::new(SourceKind::Procfs, target);

    for line in text.lines() {
        let sample = match parse_meminfo_line(line) {
            Some(sample) => sample,
            None => {
                trace!("Skipping meminfo line: {:?}", line);
                report.skipped += 1;
                continue;
            }
        };

        if !should_report(&sample.name, config) {
            report.filtered += 1;
            continue;
        }

        let unit: UnitSymbol = sample.raw_unit.parse().map_err(|source| CollectError::Unit {
            field: sample.name.clone(),
            source,
        })?;

        let value = convert(sample.raw_value as f64, unit, target);
        emitter.publish(&CanonicalMetric::gauge(sample.name, value, target));
        report.emitted += 1;
    }

    Ok(report)
}

fn collect_fallback(
    physical: MemoryUsage,
    swap: MemoryUsage,
    target: UnitSymbol,
    emitter: &dyn Emitter,
) -> CycleReport {
    let mut report = CycleReport::new(SourceKind::Sysinfo, target);

    let counters = [
        ("MemTotal", physical.total),
        ("MemFree", physical.free),
        ("SwapTotal", swap.total),
        ("SwapFree", swap.free),
    ];

    for (name, bytes) in counters {
        let value = convert(bytes as f64, UnitSymbol::Byte, target);
        emitter.publish(&CanonicalMetric::gauge(name, value, target));
        report.emitted += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::RecordingEmitter;
    use std::io;

    struct TextSource(Option<&'static str>);

    impl PrimarySource for TextSource {
        fn can_read(&self) -> bool {
            self.0.is_some()
        }

        fn read_all(&self) -> io::Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    /// Probe succeeds but the read fails, like a file removed between calls.
    struct VanishingSource;

    impl PrimarySource for VanishingSource {
        fn can_read(&self) -> bool {
            true
        }

        fn read_all(&self) -> io::Result<String> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    struct FixedFallback(Option<(MemoryUsage, MemoryUsage)>);

    impl FallbackSource for FixedFallback {
        fn is_available(&self) -> bool {
            self.0.is_some()
        }

        fn physical_memory(&self) -> MemoryUsage {
            self.0.map(|(p, _)| p).unwrap_or_default()
        }

        fn virtual_memory(&self) -> MemoryUsage {
            self.0.map(|(_, s)| s).unwrap_or_default()
        }
    }

    /// Reports itself available, then fails every read, like a syscall that starts erroring.
    struct FlakyFallback;

    impl FallbackSource for FlakyFallback {
        fn is_available(&self) -> bool {
            true
        }

        fn physical_memory(&self) -> MemoryUsage {
            MemoryUsage::default()
        }

        fn virtual_memory(&self) -> MemoryUsage {
            MemoryUsage::default()
        }

        fn snapshot(&self) -> Option<(MemoryUsage, MemoryUsage)> {
            None
        }
    }

    fn fallback() -> FixedFallback {
        FixedFallback(Some((
            MemoryUsage {
                total: 17_000_000_000,
                free: 2_000_000_000,
            },
            MemoryUsage { total: 0, free: 0 },
        )))
    }

    #[test]
    fn test_primary_wins_over_fallback() {
        let collector = MemoryCollector::with_sources(
            TextSource(Some("MemTotal: 1 kB\n")),
            Some(fallback()),
        );
        assert_eq!(
            collector.select_source(),
            Some(ActiveSource::Primary("MemTotal: 1 kB\n".to_string()))
        );
    }

    #[test]
    fn test_failed_read_falls_back() {
        let collector = MemoryCollector::with_sources(VanishingSource, Some(fallback()));
        let emitter = RecordingEmitter::new();

        let outcome = collector
            .collect(&RuntimeConfig::default(), &emitter)
            .unwrap();
        assert_eq!(outcome.report().map(|r| r.source), Some(SourceKind::Sysinfo));
    }

    #[test]
    fn test_disabled_fallback_means_no_data() {
        let collector: MemoryCollector<TextSource, FixedFallback> =
            MemoryCollector::with_sources(TextSource(None), None);
        let emitter = RecordingEmitter::new();

        let outcome = collector
            .collect(&RuntimeConfig::default(), &emitter)
            .unwrap();
        assert!(outcome.is_no_data());
        assert!(emitter.is_empty());
    }

    #[test]
    fn test_failed_fallback_read_is_no_data_not_zeros() {
        let collector = MemoryCollector::with_sources(TextSource(None), Some(FlakyFallback));
        let emitter = RecordingEmitter::new();

        let outcome = collector
            .collect(&RuntimeConfig::default(), &emitter)
            .unwrap();
        assert!(outcome.is_no_data());
        assert!(emitter.is_empty());
    }

    #[test]
    fn test_empty_target_list_is_fatal() {
        let collector = MemoryCollector::with_sources(
            TextSource(Some("MemTotal: 1 kB\n")),
            Some(fallback()),
        );
        let emitter = RecordingEmitter::new();
        let config = RuntimeConfig::new(false, Vec::new());

        assert_eq!(
            collector.collect(&config, &emitter),
            Err(CollectError::MissingTargetUnit)
        );
        assert!(emitter.is_empty());
    }

    #[test]
    fn test_unknown_source_unit_is_fatal() {
        let collector = MemoryCollector::with_sources(
            TextSource(Some("MemTotal: 10 pages\n")),
            Some(fallback()),
        );
        let emitter = RecordingEmitter::new();

        let err = collector
            .collect(&RuntimeConfig::default(), &emitter)
            .unwrap_err();
        assert_eq!(
            err,
            CollectError::Unit {
                field: "MemTotal".to_string(),
                source: UnitError::Unknown("pages".to_string()),
            }
        );
    }

    #[test]
    fn test_report_counts_filtered_and_skipped() {
        let collector: MemoryCollector<TextSource, FixedFallback> = MemoryCollector::with_sources(
            TextSource(Some(
                "MemTotal: 4 kB\nSlab: 2 kB\nHugePages_Total: 0\n\nMemFree: 1 kB\n",
            )),
            None,
        );
        let emitter = RecordingEmitter::new();

        let outcome = collector
            .collect(&RuntimeConfig::default(), &emitter)
            .unwrap();
        let report = outcome.report().copied().unwrap();
        assert_eq!(report.source, SourceKind::Procfs);
        assert_eq!(report.unit, UnitSymbol::Byte);
        assert_eq!(report.emitted, 2);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(emitter.value_of("MemTotal"), Some(4096.0));
    }

    #[test]
    fn test_only_first_unit_is_applied() {
        let collector: MemoryCollector<TextSource, FixedFallback> =
            MemoryCollector::with_sources(TextSource(Some("MemTotal: 2048 kB\n")), None);
        let emitter = RecordingEmitter::new();
        let config = RuntimeConfig::new(false, vec![UnitSymbol::Megabyte, UnitSymbol::Byte]);

        collector.collect(&config, &emitter).unwrap();

        let metrics = emitter.metrics();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].value, 2.0);
        assert_eq!(metrics[0].unit, UnitSymbol::Megabyte);
    }

    #[test]
    fn test_runtime_config_from_unit_names() {
        let config = RuntimeConfig::from_unit_names(true, &["kB", "megabyte"]).unwrap();
        assert!(config.detailed);
        assert_eq!(config.target_unit(), Some(UnitSymbol::Kilobyte));

        assert_eq!(
            RuntimeConfig::from_unit_names(false, &["parsec"]),
            Err(UnitError::Unknown("parsec".to_string()))
        );
    }
}
