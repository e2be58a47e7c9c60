//! Collect command implementation.
//!
//! Runs a single collection cycle and prints what was emitted.

use herakles_memory_collector::{CanonicalMetric, CycleOutcome, CycleReport, RecordingEmitter};
use serde::Serialize;
use std::time::Instant;

use crate::cli::OutputFormat;
use crate::config::Config;

/// JSON document printed by `collect --format json`.
#[derive(Debug, Serialize)]
struct CollectOutput {
    /// Set when `enabled: false`; no cycle ran.
    disabled: bool,
    no_data: bool,
    report: Option<CycleReport>,
    duration_ms: f64,
    metrics: Vec<CanonicalMetric>,
}

/// Runs one cycle, unless collection is disabled.
fn run_once(config: &Config) -> Result<(Option<CycleOutcome>, CollectOutput), Box<dyn std::error::Error>> {
    let runtime = config.runtime_config()?;
    let collector = config.memory_collector();
    let emitter = RecordingEmitter::new();

    let start = Instant::now();
    let outcome = if config.is_enabled() {
        Some(collector.collect(&runtime, &emitter)?)
    } else {
        None
    };
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    let output = CollectOutput {
        disabled: outcome.is_none(),
        no_data: outcome.as_ref().is_some_and(CycleOutcome::is_no_data),
        report: outcome.as_ref().and_then(|o| o.report().copied()),
        duration_ms,
        metrics: emitter.metrics(),
    };
    Ok((outcome, output))
}

/// Runs one cycle with the effective configuration.
pub fn command_collect(
    format: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (outcome, output) = run_once(config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print_text(outcome.as_ref(), &output, config),
    }

    Ok(())
}

fn print_text(outcome: Option<&CycleOutcome>, output: &CollectOutput, config: &Config) {
    println!("🧪 Herakles Memory Collector - Single Cycle");
    println!("============================================");

    let report = match outcome {
        None => {
            println!("\n⚠️  Collection disabled in configuration (enabled: false)");
            return;
        }
        Some(CycleOutcome::Collected(report)) => report,
        Some(CycleOutcome::NoData) => {
            println!("\n❌ No data: neither {} nor sysinfo(2) is available", config.meminfo_path().display());
            return;
        }
    };

    println!("\n📁 Source: {}", report.source.as_str());
    println!("📏 Unit:   {}", report.unit);
    println!();

    let width = output.metrics.iter().map(|m| m.name.len()).max().unwrap_or(0);
    for metric in &output.metrics {
        println!(
            "   {:width$}  {:>20.3} {}",
            metric.name,
            metric.value,
            metric.unit,
            width = width
        );
    }

    println!();
    println!("   ⏱️  Cycle duration: {:.2}ms", output.duration_ms);
    println!(
        "   📊 Emitted: {}, filtered: {}, skipped lines: {}",
        report.emitted, report.filtered, report.skipped
    );
}
