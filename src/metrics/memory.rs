//! Process memory introspection.
//!
//! Probes are best-effort: `None` means "not measurable here", never an error.

use std::sync::Arc;

/// Source of a "bytes currently in use" reading.
pub trait MemoryProbe: Send + Sync {
    /// Current usage in bytes, or `None` when the environment exposes nothing.
    fn current_bytes(&self) -> Option<u64>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Probe that never reports anything; memory usage is omitted from metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn current_bytes(&self) -> Option<u64> {
        None
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Resident set size read from `/proc/self/status` (`VmRSS`).
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcStatusProbe;

impl MemoryProbe for ProcStatusProbe {
    fn current_bytes(&self) -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }

    fn name(&self) -> &'static str {
        "proc-status"
    }
}

pub(crate) fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let mut parts = line["VmRSS:".len()..].split_whitespace();
    let value: u64 = parts.next()?.parse().ok()?;
    let unit = parts.next().unwrap_or("kB");
    let factor = match unit {
        "kB" | "KB" | "kb" => 1024,
        "mB" | "MB" => 1024 * 1024,
        "B" => 1,
        _ => return None,
    };
    value.checked_mul(factor)
}

/// Live heap bytes counted by the instrumented global allocator.
#[cfg(feature = "alloc-track")]
#[derive(Clone, Copy, Debug, Default)]
pub struct AllocTrackProbe;

#[cfg(feature = "alloc-track")]
mod alloc_track {
    use stats_alloc::{INSTRUMENTED_SYSTEM, StatsAlloc};
    use std::alloc::System;

    #[global_allocator]
    static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

    pub(super) fn live_bytes() -> u64 {
        let s = GLOBAL.stats();
        let live = s.bytes_allocated as i128 - s.bytes_deallocated as i128
            + s.bytes_reallocated as i128;
        live.max(0) as u64
    }
}

#[cfg(feature = "alloc-track")]
impl MemoryProbe for AllocTrackProbe {
    fn current_bytes(&self) -> Option<u64> {
        Some(alloc_track::live_bytes())
    }

    fn name(&self) -> &'static str {
        "alloc-track"
    }
}

/// Best probe available in this build and on this platform.
pub fn default_probe() -> Arc<dyn MemoryProbe> {
    #[cfg(feature = "alloc-track")]
    {
        Arc::new(AllocTrackProbe)
    }
    #[cfg(not(feature = "alloc-track"))]
    {
        if cfg!(target_os = "linux") && ProcStatusProbe.current_bytes().is_some() {
            Arc::new(ProcStatusProbe)
        } else {
            Arc::new(NoMemoryProbe)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/metrics/memory.rs"]
mod tests;
