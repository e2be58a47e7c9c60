//! Field selection for meminfo counters.

use ahash::AHashSet;
use once_cell::sync::Lazy;

use crate::collector::RuntimeConfig;

/// Counters reported when detailed collection is off.
pub const WELL_KNOWN_FIELDS: [&str; 14] = [
    "MemTotal",
    "MemFree",
    "Buffers",
    "Cached",
    "Active",
    "Dirty",
    "Inactive",
    "Shmem",
    "SwapTotal",
    "SwapFree",
    "SwapCached",
    "VmallocTotal",
    "VmallocUsed",
    "VmallocChunk",
];

static WELL_KNOWN: Lazy<AHashSet<&'static str>> =
    Lazy::new(|| WELL_KNOWN_FIELDS.iter().copied().collect());

/// Returns true if the counter `name` should be reported.
pub fn should_report(name: &str, config: &RuntimeConfig) -> bool {
    config.detailed || is_well_known(name)
}

pub fn is_well_known(name: &str) -> bool {
    WELL_KNOWN.contains(name)
}
