//! Cooperative cancellation and process memory probing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a driver can keep one clone and cancel a
/// pass running against the [`TermManager`](crate::ast::TermManager) that owns
/// the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// A flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }

    /// Has cancellation been requested?
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Snapshot of process memory usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Resident set size in bytes.
    pub rss_bytes: u64,
    /// Peak resident set size in bytes.
    pub peak_rss_bytes: u64,
}

impl MemoryUsage {
    /// Current usage of this process (all zero where unsupported).
    #[must_use]
    pub fn current() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self::from_proc_status()
        }
        #[cfg(not(target_os = "linux"))]
        {
            Self::default()
        }
    }

    #[cfg(target_os = "linux")]
    fn from_proc_status() -> Self {
        let mut usage = Self::default();
        if let Ok(content) = std::fs::read_to_string("/proc/self/status") {
            usage = Self::parse_status(&content);
        }
        usage
    }

    /// Parse the `VmRSS`/`VmHWM` lines of a `/proc/<pid>/status` dump.
    #[must_use]
    pub fn parse_status(content: &str) -> Self {
        let mut usage = Self::default();
        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            // kB to bytes
            let value = value.parse::<u64>().unwrap_or(0).saturating_mul(1024);
            match key {
                "VmRSS:" => usage.rss_bytes = value,
                "VmHWM:" => usage.peak_rss_bytes = value,
                _ => {}
            }
        }
        usage
    }

    /// Resident set size in bytes.
    #[must_use]
    pub fn allocated_bytes() -> u64 {
        Self::current().rss_bytes
    }
}
