//! /proc/meminfo source reader and line parser.
//!
//! The kernel exposes one counter per line in the form
//! `MemTotal:       16384000 kB`. Lines that do not have exactly a name, an
//! integer value and a unit (e.g. `HugePages_Total:       0`) are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default location of the kernel memory counters.
pub const PROC_MEMINFO: &str = "/proc/meminfo";

/// One counter parsed from a meminfo line, before unit conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    pub name: String,
    pub raw_value: u64,
    /// Unit token exactly as it appeared in the source text.
    pub raw_unit: String,
}

/// Parses a single meminfo line.
///
/// Returns `None` for blank lines, headers and malformed rows.
pub fn parse_meminfo_line(line: &str) -> Option<RawSample> {
    let mut parts = line.split_whitespace();
    let (name, value, unit) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(value), Some(unit), None) => (name, value, unit),
        _ => return None,
    };

    let raw_value = value.parse::<u64>().ok()?;

    Some(RawSample {
        name: name.trim_end_matches(':').to_string(),
        raw_value,
        raw_unit: unit.to_string(),
    })
}

/// Access to the primary, text-based memory counter source.
pub trait PrimarySource {
    /// Whether the source can currently be read by this process.
    fn can_read(&self) -> bool;

    /// Reads the whole source content.
    fn read_all(&self) -> io::Result<String>;
}

/// Reader for a meminfo-formatted pseudo-file.
#[derive(Debug, Clone)]
pub struct ProcMeminfo {
    path: PathBuf,
}

impl ProcMeminfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcMeminfo {
    fn default() -> Self {
        Self::new(PROC_MEMINFO)
    }
}

impl PrimarySource for ProcMeminfo {
    fn can_read(&self) -> bool {
        is_readable(&self.path)
    }

    fn read_all(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Checks read permission with access(2), without opening the file.
#[cfg(unix)]
fn is_readable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = match CString::new(path.as_os_str().as_bytes()) {
        Ok(p) => p,
        Err(_) => return false,
    };

    // SAFETY: c_path is a valid NUL-terminated string that outlives the call
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK) == 0 }
}

#[cfg(not(unix))]
fn is_readable(path: &Path) -> bool {
    fs::File::open(path).is_ok()
}
