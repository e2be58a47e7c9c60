//! Integration tests for the memory collection cycle.
//!
//! These tests drive `MemoryCollector` through its sources with in-test fakes
//! and real meminfo files on disk, recording everything that gets published.

use herakles_memory_collector::collectors::{
    FallbackSource, MemoryUsage, PrimarySource, ProcMeminfo, WELL_KNOWN_FIELDS,
};
use herakles_memory_collector::{
    CollectError, CycleOutcome, MemoryCollector, RecordingEmitter, RuntimeConfig, SourceKind,
    UnitSymbol,
};
use std::io::{self, Write};

/// Primary source backed by a fixed string, or unreadable when `None`.
struct StaticText(Option<String>);

impl StaticText {
    fn readable(text: &str) -> Self {
        StaticText(Some(text.to_string()))
    }

    fn unreadable() -> Self {
        StaticText(None)
    }
}

impl PrimarySource for StaticText {
    fn can_read(&self) -> bool {
        self.0.is_some()
    }

    fn read_all(&self) -> io::Result<String> {
        self.0
            .clone()
            .ok_or_else(|| io::Error::from(io::ErrorKind::PermissionDenied))
    }
}

/// Fallback returning fixed usage figures, or unavailable when `None`.
struct StaticUsage(Option<(MemoryUsage, MemoryUsage)>);

impl FallbackSource for StaticUsage {
    fn is_available(&self) -> bool {
        self.0.is_some()
    }

    fn physical_memory(&self) -> MemoryUsage {
        self.0.map(|(p, _)| p).unwrap_or_default()
    }

    fn virtual_memory(&self) -> MemoryUsage {
        self.0.map(|(_, v)| v).unwrap_or_default()
    }
}

fn scenario_b_fallback() -> StaticUsage {
    StaticUsage(Some((
        MemoryUsage {
            total: 17_000_000_000,
            free: 2_000_000_000,
        },
        MemoryUsage { total: 0, free: 0 },
    )))
}

fn kilobytes(detailed: bool) -> RuntimeConfig {
    RuntimeConfig::new(detailed, vec![UnitSymbol::Kilobyte])
}

const FULL_MEMINFO: &str = "MemTotal:       16384000 kB
MemFree:         2048000 kB
MemAvailable:    8192000 kB
Buffers:          512000 kB
Cached:          4096000 kB
SwapCached:            0 kB
Active:          6000000 kB
Inactive:        3000000 kB
Dirty:               128 kB
Shmem:             65536 kB
Slab:             400000 kB
SwapTotal:       2097152 kB
SwapFree:        2097152 kB
VmallocTotal:   34359738367 kB
VmallocUsed:       45000 kB
VmallocChunk:          0 kB
HugePages_Total:       0
HugePages_Free:        0
Hugepagesize:       2048 kB
";

#[test]
fn test_scenario_a_well_known_fields_in_kilobytes() {
    let collector = MemoryCollector::with_sources(
        StaticText::readable("MemTotal: 16384000 kB\nMemFree: 2048000 kB\ngarbage line\n"),
        Some(scenario_b_fallback()),
    );
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&kilobytes(false), &emitter).unwrap();

    let report = outcome.report().copied().unwrap();
    assert_eq!(report.source, SourceKind::Procfs);
    assert_eq!(report.emitted, 2);
    assert_eq!(report.skipped, 1);

    assert_eq!(emitter.names(), vec!["MemTotal", "MemFree"]);
    assert_eq!(emitter.value_of("MemTotal"), Some(16_384_000.0));
    assert_eq!(emitter.value_of("MemFree"), Some(2_048_000.0));
    assert!(emitter
        .metrics()
        .iter()
        .all(|m| m.unit == UnitSymbol::Kilobyte));
}

#[test]
fn test_scenario_b_fallback_in_kilobytes() {
    let collector = MemoryCollector::with_sources(StaticText::unreadable(), Some(scenario_b_fallback()));
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&kilobytes(false), &emitter).unwrap();

    assert_eq!(outcome.report().map(|r| r.source), Some(SourceKind::Sysinfo));
    assert_eq!(emitter.names(), vec!["MemTotal", "MemFree", "SwapTotal", "SwapFree"]);

    let total = emitter.value_of("MemTotal").unwrap();
    let free = emitter.value_of("MemFree").unwrap();
    assert!((total - 16_601_562.5).abs() < 1e-6);
    assert!((free - 1_953_125.0).abs() < 1e-6);
    assert_eq!(emitter.value_of("SwapTotal"), Some(0.0));
    assert_eq!(emitter.value_of("SwapFree"), Some(0.0));
}

#[test]
fn test_fallback_ignores_detailed_flag() {
    for detailed in [false, true] {
        let collector =
            MemoryCollector::with_sources(StaticText::unreadable(), Some(scenario_b_fallback()));
        let emitter = RecordingEmitter::new();

        collector.collect(&kilobytes(detailed), &emitter).unwrap();
        assert_eq!(emitter.len(), 4, "detailed={}", detailed);
    }
}

#[test]
fn test_well_known_mode_only_emits_allow_listed_fields() {
    let collector: MemoryCollector<StaticText, StaticUsage> =
        MemoryCollector::with_sources(StaticText::readable(FULL_MEMINFO), None);
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&kilobytes(false), &emitter).unwrap();

    let names = emitter.names();
    assert_eq!(names.len(), WELL_KNOWN_FIELDS.len());
    assert!(names.iter().all(|n| WELL_KNOWN_FIELDS.contains(&n.as_str())));
    assert!(!names.contains(&"MemAvailable".to_string()));
    assert!(!names.contains(&"Slab".to_string()));

    let report = outcome.report().copied().unwrap();
    // MemAvailable, Slab, Hugepagesize
    assert_eq!(report.filtered, 3);
    // HugePages_Total, HugePages_Free
    assert_eq!(report.skipped, 2);
}

#[test]
fn test_detailed_mode_emits_every_parsed_line() {
    let collector: MemoryCollector<StaticText, StaticUsage> =
        MemoryCollector::with_sources(StaticText::readable(FULL_MEMINFO), None);
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&kilobytes(true), &emitter).unwrap();

    let report = outcome.report().copied().unwrap();
    assert_eq!(report.emitted, 17);
    assert_eq!(report.filtered, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(emitter.value_of("Slab"), Some(400_000.0));
    assert_eq!(emitter.value_of("Hugepagesize"), Some(2048.0));
}

#[test]
fn test_conversion_to_megabytes() {
    let collector: MemoryCollector<StaticText, StaticUsage> =
        MemoryCollector::with_sources(StaticText::readable(FULL_MEMINFO), None);
    let emitter = RecordingEmitter::new();
    let config = RuntimeConfig::from_unit_names(false, &["MiB"]).unwrap();

    collector.collect(&config, &emitter).unwrap();

    assert_eq!(emitter.value_of("MemTotal"), Some(16_000.0));
    assert_eq!(emitter.value_of("Buffers"), Some(500.0));
    assert_eq!(emitter.value_of("Dirty"), Some(0.125));
}

#[test]
fn test_neither_source_is_no_data() {
    let collector =
        MemoryCollector::with_sources(StaticText::unreadable(), Some(StaticUsage(None)));
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&RuntimeConfig::default(), &emitter).unwrap();

    assert_eq!(outcome, CycleOutcome::NoData);
    assert!(outcome.report().is_none());
    assert!(emitter.is_empty());
}

#[test]
fn test_empty_primary_is_success_with_zero_metrics() {
    let collector = MemoryCollector::with_sources(StaticText::readable(""), Some(scenario_b_fallback()));
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&RuntimeConfig::default(), &emitter).unwrap();

    assert!(!outcome.is_no_data());
    assert_eq!(outcome.report().map(|r| r.emitted), Some(0));
    assert!(emitter.is_empty());
}

#[test]
fn test_unknown_source_unit_aborts_cycle() {
    let collector: MemoryCollector<StaticText, StaticUsage> = MemoryCollector::with_sources(
        StaticText::readable("MemTotal: 1 kB\nMemFree: 1 furlong\n"),
        None,
    );
    let emitter = RecordingEmitter::new();

    let err = collector
        .collect(&RuntimeConfig::default(), &emitter)
        .unwrap_err();

    assert!(matches!(err, CollectError::Unit { ref field, .. } if field == "MemFree"));
    // Counters before the bad line were already published.
    assert_eq!(emitter.names(), vec!["MemTotal"]);
}

#[test]
fn test_empty_target_list_aborts_before_probing() {
    let collector = MemoryCollector::with_sources(StaticText::unreadable(), Some(scenario_b_fallback()));
    let emitter = RecordingEmitter::new();

    let result = collector.collect(&RuntimeConfig::new(false, Vec::new()), &emitter);

    assert_eq!(result, Err(CollectError::MissingTargetUnit));
    assert!(emitter.is_empty());
}

#[test]
fn test_real_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", FULL_MEMINFO).unwrap();

    let collector: MemoryCollector<ProcMeminfo, StaticUsage> =
        MemoryCollector::with_sources(ProcMeminfo::new(file.path()), None);
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&RuntimeConfig::default(), &emitter).unwrap();

    assert_eq!(outcome.report().map(|r| r.source), Some(SourceKind::Procfs));
    assert_eq!(emitter.value_of("MemTotal"), Some(16_384_000.0 * 1024.0));
}

#[test]
fn test_missing_file_uses_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let collector = MemoryCollector::with_sources(
        ProcMeminfo::new(dir.path().join("meminfo")),
        Some(scenario_b_fallback()),
    );
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&RuntimeConfig::default(), &emitter).unwrap();

    assert_eq!(outcome.report().map(|r| r.source), Some(SourceKind::Sysinfo));
    assert_eq!(emitter.value_of("MemTotal"), Some(17_000_000_000.0));
}

#[cfg(target_os = "linux")]
#[test]
fn test_live_system_produces_data() {
    let collector = MemoryCollector::new();
    let emitter = RecordingEmitter::new();

    let outcome = collector.collect(&RuntimeConfig::default(), &emitter).unwrap();

    assert!(!outcome.is_no_data());
    assert!(emitter.value_of("MemTotal").unwrap_or(0.0) > 0.0);
}
