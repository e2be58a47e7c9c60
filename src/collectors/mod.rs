//! Memory counter sources.
//!
//! - `meminfo`: primary source, the /proc/meminfo text interface and its parser
//! - `sysinfo`: fallback source, four aggregate counters from sysinfo(2)
//! - `filter`: well-known field selection applied to the primary source

pub mod filter;
pub mod meminfo;
pub mod sysinfo;

pub use filter::{should_report, WELL_KNOWN_FIELDS};
pub use meminfo::{parse_meminfo_line, PrimarySource, ProcMeminfo, RawSample, PROC_MEMINFO};
pub use sysinfo::{FallbackSource, MemoryUsage, SysinfoMemory};
