//! Collection cycle statistics.
//!
//! Tracks how cycles went (which source served them, how many counters were
//! emitted or skipped, how long they took) for the `/health` endpoint.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Instant, SystemTime};

use crate::collector::{CycleOutcome, SourceKind};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Statistics over all collection cycles since startup.
pub struct CycleStats {
    pub cycle_duration_seconds: Stat,
    pub emitted_metrics: Stat,
    pub skipped_lines: Stat,

    pub total_cycles: AtomicU64,
    pub procfs_cycles: AtomicU64,
    pub sysinfo_cycles: AtomicU64,
    pub no_data_cycles: AtomicU64,
    pub failed_cycles: AtomicU64,

    last_cycle_ok: AtomicBool,
    last_cycle_failed: AtomicBool,
    pub start_time: Instant,
    pub last_cycle_time: StdRwLock<Option<Instant>>,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self {
            cycle_duration_seconds: Stat::default(),
            emitted_metrics: Stat::default(),
            skipped_lines: Stat::default(),
            total_cycles: AtomicU64::new(0),
            procfs_cycles: AtomicU64::new(0),
            sysinfo_cycles: AtomicU64::new(0),
            no_data_cycles: AtomicU64::new(0),
            failed_cycles: AtomicU64::new(0),
            last_cycle_ok: AtomicBool::new(false),
            last_cycle_failed: AtomicBool::new(false),
            start_time: Instant::now(),
            last_cycle_time: StdRwLock::new(None),
        }
    }
}

impl CycleStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a finished cycle. `None` stands for a cycle aborted by an error.
    pub fn record_cycle(&self, outcome: Option<&CycleOutcome>, duration_seconds: f64) {
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        self.cycle_duration_seconds.add_sample(duration_seconds);

        let ok = match outcome {
            Some(CycleOutcome::Collected(report)) => {
                let counter = match report.source {
                    SourceKind::Procfs => &self.procfs_cycles,
                    SourceKind::Sysinfo => &self.sysinfo_cycles,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                self.emitted_metrics.add_sample(report.emitted as f64);
                self.skipped_lines.add_sample(report.skipped as f64);
                true
            }
            Some(CycleOutcome::NoData) => {
                self.no_data_cycles.fetch_add(1, Ordering::Relaxed);
                false
            }
            None => {
                self.failed_cycles.fetch_add(1, Ordering::Relaxed);
                false
            }
        };

        self.last_cycle_ok.store(ok, Ordering::Relaxed);
        self.last_cycle_failed
            .store(outcome.is_none(), Ordering::Relaxed);
        if let Ok(mut guard) = self.last_cycle_time.write() {
            *guard = Some(Instant::now());
        }
    }

    /// True once a cycle ran and the latest one produced data.
    pub fn last_cycle_ok(&self) -> bool {
        self.last_cycle_ok.load(Ordering::Relaxed)
    }

    /// True when the latest cycle was aborted by an error (not a no-data cycle).
    pub fn last_cycle_failed(&self) -> bool {
        self.last_cycle_failed.load(Ordering::Relaxed)
    }

    pub fn last_cycle_time_is_set(&self) -> bool {
        self.last_cycle_time
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn get_success_rate(&self) -> f64 {
        let total = self.total_cycles.load(Ordering::Relaxed);
        if total == 0 {
            return 100.0;
        }
        let success = self.procfs_cycles.load(Ordering::Relaxed)
            + self.sysinfo_cycles.load(Ordering::Relaxed);
        (success as f64 / total as f64) * 100.0
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_cycle_time_str(&self) -> String {
        const SECS_PER_DAY: u64 = 86400;
        const SECS_PER_HOUR: u64 = 3600;
        const SECS_PER_MINUTE: u64 = 60;

        if let Ok(guard) = self.last_cycle_time.read() {
            if let Some(last_cycle) = *guard {
                let elapsed = last_cycle.elapsed();
                if let Ok(now) = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
                    let cycle_secs = now.as_secs().saturating_sub(elapsed.as_secs());
                    let hours = (cycle_secs % SECS_PER_DAY) / SECS_PER_HOUR;
                    let minutes = (cycle_secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
                    let seconds = cycle_secs % SECS_PER_MINUTE;
                    return format!("{:02}:{:02}:{:02} UTC", hours, minutes, seconds);
                }
            }
        }
        "N/A".to_string()
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.cycle_duration_seconds.snapshot();
        let (em_cur, em_avg, em_max, em_min, _) = self.emitted_metrics.snapshot();
        let (sk_cur, sk_avg, sk_max, sk_min, _) = self.skipped_lines.snapshot();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "COLLECTION CYCLES").ok();
        writeln!(out, "=================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        let rows = [
            ("cycle_duration (s)", cd_cur, cd_avg, cd_max, cd_min, 4usize),
            ("emitted_metrics", em_cur, em_avg, em_max, em_min, 0),
            ("skipped_lines", sk_cur, sk_avg, sk_max, sk_min, 0),
        ];
        for (label, cur, avg, max, min, precision) in rows {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{:.p$}", cur, p = precision),
                format!("{:.p$}", avg, p = precision.max(1)),
                format!("{:.p$}", max, p = precision),
                format!("{:.p$}", min, p = precision),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "SOURCES").ok();
        writeln!(out, "-------").ok();

        let counters = [
            ("total_cycles", &self.total_cycles),
            ("procfs_cycles", &self.procfs_cycles),
            ("sysinfo_cycles", &self.sysinfo_cycles),
            ("no_data_cycles", &self.no_data_cycles),
            ("failed_cycles", &self.failed_cycles),
        ];
        for (label, counter) in counters {
            writeln!(
                out,
                "{:left$} | {:>col$}",
                label,
                counter.load(Ordering::Relaxed),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(
            out,
            "{:left$} | {:>col$}",
            "success_rate (%)",
            format!("{:.1}", self.get_success_rate()),
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {:>col$}",
            "last_cycle",
            self.get_last_cycle_time_str(),
            left = left_col,
            col = col_w
        )
        .ok();

        out
    }
}
