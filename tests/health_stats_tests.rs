//! Integration tests for the cycle statistics module.
//!
//! These tests verify that CycleStats tracks sources, failures and per-cycle
//! samples, and that the rendered table exposes them.

use herakles_memory_collector::health_stats::CycleStats;
use herakles_memory_collector::{CycleOutcome, CycleReport, SourceKind, UnitSymbol};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

fn collected(source: SourceKind, emitted: usize, skipped: usize) -> CycleOutcome {
    CycleOutcome::Collected(CycleReport {
        source,
        unit: UnitSymbol::Byte,
        emitted,
        filtered: 0,
        skipped,
    })
}

#[test]
fn test_cycle_stats_initialize() {
    let stats = CycleStats::new();

    let (cd_cur, cd_avg, _, _, cd_count) = stats.cycle_duration_seconds.snapshot();
    assert_eq!(cd_count, 0);
    assert_eq!(cd_cur, 0.0);
    assert_eq!(cd_avg, 0.0);

    assert_eq!(stats.total_cycles.load(Ordering::Relaxed), 0);
    assert_eq!(stats.failed_cycles.load(Ordering::Relaxed), 0);
    assert!(!stats.last_cycle_ok());
    assert!(!stats.last_cycle_time_is_set());
}

#[test]
fn test_cycle_stats_recording() {
    let stats = CycleStats::new();

    stats.record_cycle(Some(&collected(SourceKind::Procfs, 14, 2)), 0.002);
    stats.record_cycle(Some(&collected(SourceKind::Sysinfo, 4, 0)), 0.001);

    assert_eq!(stats.total_cycles.load(Ordering::Relaxed), 2);
    assert_eq!(stats.procfs_cycles.load(Ordering::Relaxed), 1);
    assert_eq!(stats.sysinfo_cycles.load(Ordering::Relaxed), 1);
    assert!(stats.last_cycle_ok());
    assert!(stats.last_cycle_time_is_set());

    let (em_cur, em_avg, em_max, em_min, em_count) = stats.emitted_metrics.snapshot();
    assert_eq!(em_count, 2);
    assert_eq!(em_cur, 4.0);
    assert_eq!(em_avg, 9.0);
    assert_eq!(em_max, 14.0);
    assert_eq!(em_min, 4.0);

    let (sk_cur, _, sk_max, _, _) = stats.skipped_lines.snapshot();
    assert_eq!(sk_cur, 0.0);
    assert_eq!(sk_max, 2.0);
}

#[test]
fn test_no_data_and_failures_clear_last_cycle_ok() {
    let stats = CycleStats::new();

    stats.record_cycle(Some(&collected(SourceKind::Procfs, 14, 0)), 0.001);
    assert!(stats.last_cycle_ok());

    stats.record_cycle(Some(&CycleOutcome::NoData), 0.0);
    assert!(!stats.last_cycle_ok());
    assert_eq!(stats.no_data_cycles.load(Ordering::Relaxed), 1);

    stats.record_cycle(None, 0.0);
    assert!(!stats.last_cycle_ok());
    assert_eq!(stats.failed_cycles.load(Ordering::Relaxed), 1);

    // Only collected cycles feed the emitted/skipped samples.
    let (_, _, _, _, em_count) = stats.emitted_metrics.snapshot();
    assert_eq!(em_count, 1);

    let rate = stats.get_success_rate();
    assert!((rate - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_render_table_contains_sections() {
    let stats = CycleStats::new();
    stats.record_cycle(Some(&collected(SourceKind::Procfs, 14, 2)), 0.0015);

    let table = stats.render_table();

    assert!(table.contains("COLLECTION CYCLES"));
    assert!(table.contains("cycle_duration (s)"));
    assert!(table.contains("emitted_metrics"));
    assert!(table.contains("skipped_lines"));
    assert!(table.contains("SOURCES"));
    assert!(table.contains("procfs_cycles"));
    assert!(table.contains("no_data_cycles"));
    assert!(table.contains("success_rate (%)"));
    assert!(table.contains("UTC"));
}

#[test]
fn test_concurrent_recording() {
    let stats = Arc::new(CycleStats::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for _ in 0..250 {
                    stats.record_cycle(Some(&collected(SourceKind::Procfs, 14, 0)), 0.001);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stats.total_cycles.load(Ordering::Relaxed), 1000);
    assert_eq!(stats.procfs_cycles.load(Ordering::Relaxed), 1000);
    let (_, _, _, _, count) = stats.cycle_duration_seconds.snapshot();
    assert_eq!(count, 1000);
}
