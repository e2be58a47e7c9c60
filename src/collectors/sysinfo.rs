//! Fallback memory source backed by the sysinfo(2) syscall.
//!
//! Used when /proc/meminfo cannot be read (restricted containers, hardened
//! /proc mounts). Only four aggregate counters are available this way.

use tracing::warn;

/// Total and free amount of one memory pool, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total: u64,
    pub free: u64,
}

/// Access to the native aggregate memory API.
pub trait FallbackSource {
    /// Feature detection: whether the API exists and answers on this host.
    fn is_available(&self) -> bool;

    /// Physical RAM.
    fn physical_memory(&self) -> MemoryUsage;

    /// Swap space.
    fn virtual_memory(&self) -> MemoryUsage;

    /// Physical and swap usage from one consistent read, `None` when the
    /// API does not answer.
    fn snapshot(&self) -> Option<(MemoryUsage, MemoryUsage)> {
        if self.is_available() {
            Some((self.physical_memory(), self.virtual_memory()))
        } else {
            None
        }
    }
}

/// [`FallbackSource`] reading `struct sysinfo` from the kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoMemory;

impl SysinfoMemory {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
fn read_sysinfo() -> Option<libc::sysinfo> {
    use std::mem;

    unsafe {
        // SAFETY: libc::sysinfo only contains integer fields and padding,
        // which are valid for zeroed memory initialization
        let mut info: libc::sysinfo = mem::zeroed();
        if libc::sysinfo(&mut info) == 0 {
            Some(info)
        } else {
            None
        }
    }
}

/// Kernels before 2.3.23 report mem_unit as 0, meaning plain bytes.
#[cfg(target_os = "linux")]
fn to_bytes(value: libc::c_ulong, mem_unit: libc::c_uint) -> u64 {
    (value as u64).saturating_mul((mem_unit as u64).max(1))
}

#[cfg(target_os = "linux")]
fn physical(info: &libc::sysinfo) -> MemoryUsage {
    MemoryUsage {
        total: to_bytes(info.totalram, info.mem_unit),
        free: to_bytes(info.freeram, info.mem_unit),
    }
}

#[cfg(target_os = "linux")]
fn swap(info: &libc::sysinfo) -> MemoryUsage {
    MemoryUsage {
        total: to_bytes(info.totalswap, info.mem_unit),
        free: to_bytes(info.freeswap, info.mem_unit),
    }
}

#[cfg(target_os = "linux")]
impl FallbackSource for SysinfoMemory {
    fn is_available(&self) -> bool {
        read_sysinfo().is_some()
    }

    fn physical_memory(&self) -> MemoryUsage {
        match read_sysinfo() {
            Some(info) => physical(&info),
            None => {
                warn!("sysinfo(2) failed, reporting empty physical memory");
                MemoryUsage::default()
            }
        }
    }

    fn virtual_memory(&self) -> MemoryUsage {
        match read_sysinfo() {
            Some(info) => swap(&info),
            None => {
                warn!("sysinfo(2) failed, reporting empty swap");
                MemoryUsage::default()
            }
        }
    }

    fn snapshot(&self) -> Option<(MemoryUsage, MemoryUsage)> {
        read_sysinfo().map(|info| (physical(&info), swap(&info)))
    }
}

#[cfg(not(target_os = "linux"))]
impl FallbackSource for SysinfoMemory {
    fn is_available(&self) -> bool {
        false
    }

    fn physical_memory(&self) -> MemoryUsage {
        MemoryUsage::default()
    }

    fn virtual_memory(&self) -> MemoryUsage {
        MemoryUsage::default()
    }
}
