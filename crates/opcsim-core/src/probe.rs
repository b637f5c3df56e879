//! Clock and memory collaborators for computed variables.
//!
//! Computed variables read live state through these traits so that the
//! builder can be exercised with fixed values in tests.

use std::sync::Mutex;

use chrono::{Timelike, Utc};
use sysinfo::System;

/// Errors returned by memory probes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The host does not report memory statistics.
    #[error("memory statistics unavailable: {0}")]
    Unavailable(&'static str),

    /// The probe's state lock was poisoned.
    #[error("memory probe lock poisoned")]
    Poisoned,
}

/// Source of the current wall-clock millisecond.
pub trait Clock: Send + Sync {
    /// The millisecond within the current second, `0..1000`.
    fn millisecond(&self) -> u32;
}

/// Source of system memory figures, in bytes.
pub trait MemoryProbe: Send + Sync {
    /// Memory currently available to new allocations.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the figure cannot be obtained.
    fn free_memory(&self) -> Result<u64, ProbeError>;

    /// Total physical memory.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the figure cannot be obtained.
    fn total_memory(&self) -> Result<u64, ProbeError>;
}

/// Wall clock backed by [`chrono::Utc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn millisecond(&self) -> u32 {
        // Leap seconds report 1000..2000.
        let nanos = Utc::now().nanosecond();
        (nanos / 1_000_000).min(999)
    }
}

/// Host memory figures backed by [`sysinfo`].
///
/// Figures are refreshed on every call.
#[derive(Debug)]
pub struct SystemMemory {
    system: Mutex<System>,
}

impl SystemMemory {
    /// Probe the host's memory.
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn refreshed<F>(&self, read: F) -> Result<u64, ProbeError>
    where
        F: FnOnce(&System) -> u64,
    {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::Unavailable("unsupported platform"));
        }
        let mut system = self.system.lock().map_err(|_err| ProbeError::Poisoned)?;
        system.refresh_memory();
        Ok(read(&system))
    }
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemory {
    fn free_memory(&self) -> Result<u64, ProbeError> {
        self.refreshed(System::available_memory)
    }

    fn total_memory(&self) -> Result<u64, ProbeError> {
        match self.refreshed(System::total_memory)? {
            0 => Err(ProbeError::Unavailable("total memory reported as zero")),
            total => Ok(total),
        }
    }
}
