//! Persistence engine counters
//!
//! - Counters only, monotonic
//! - Reset only when the engine is constructed
//! - Lock-free

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one persistence engine instance.
///
/// Relaxed ordering throughout; values are exact once the engine is idle.
#[derive(Debug, Default)]
pub struct PersistMetrics {
    /// Physical writes that reached the rename step successfully
    physical_writes: AtomicU64,
    /// Physical writes that failed
    failed_writes: AtomicU64,
    /// Queued payloads replaced before reaching disk
    coalesced_writes: AtomicU64,
    /// Bytes renamed into place
    bytes_written: AtomicU64,
    /// Read attempts
    reads: AtomicU64,
    /// Reads that came back absent
    absent_reads: AtomicU64,
}

impl PersistMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful physical write of `bytes`
    pub fn record_write(&self, bytes: u64) {
        self.physical_writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed physical write
    pub fn record_failed_write(&self) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a queued payload being superseded
    pub fn record_coalesced(&self) {
        self.coalesced_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a read; `absent` when nothing usable was found
    pub fn record_read(&self, absent: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if absent {
            self.absent_reads.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Physical write attempts, successful or not
    pub fn write_attempts(&self) -> u64 {
        self.physical_writes.load(Ordering::Relaxed) + self.failed_writes.load(Ordering::Relaxed)
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            physical_writes: self.physical_writes.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
            coalesced_writes: self.coalesced_writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            absent_reads: self.absent_reads.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`PersistMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub physical_writes: u64,
    pub failed_writes: u64,
    pub coalesced_writes: u64,
    pub bytes_written: u64,
    pub reads: u64,
    pub absent_reads: u64,
}
