//! WAYBILL - Ledger Metrics & Observability
//! Provides atomic counters for tracking journal operations
//! in a lock-free, thread-safe manner using `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for the journal.
///
/// All counters use `Ordering::Relaxed`; they are read for reporting only.
#[derive(Debug)]
pub struct LedgerMetrics {
    /// Total number of `put` operations.
    pub puts: AtomicU64,
    /// Total number of `get` operations.
    pub gets: AtomicU64,
    /// Total number of `mark_deleted` operations.
    pub deletes: AtomicU64,
    /// Total number of range cursors opened.
    pub range_scans: AtomicU64,
    /// Total number of history cursors opened.
    pub history_scans: AtomicU64,
    /// Total bytes written (keys + values).
    pub bytes_written: AtomicU64,
    /// Total bytes read (values returned by get).
    pub bytes_read: AtomicU64,
    /// WAL frames replayed when the journal was opened.
    pub replayed_frames: AtomicU64,
    /// Timestamp when the journal was opened.
    opened_at: Instant,
}

impl LedgerMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            range_scans: AtomicU64::new(0),
            history_scans: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            replayed_frames: AtomicU64::new(0),
            opened_at: Instant::now(),
        }
    }

    /// Record a put operation.
    pub fn record_put(&self, key_size: usize, value_size: usize) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add((key_size + value_size) as u64, Ordering::Relaxed);
    }

    /// Record a get operation.
    pub fn record_get(&self, value_size: Option<usize>) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if let Some(size) = value_size {
            self.bytes_read.fetch_add(size as u64, Ordering::Relaxed);
        }
    }

    /// Record a tombstone append.
    pub fn record_delete(&self, key_size: usize) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(key_size as u64, Ordering::Relaxed);
    }

    pub fn record_range_scan(&self) {
        self.range_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_history_scan(&self) {
        self.history_scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Record WAL frames replayed on open.
    pub fn record_replay(&self, frames: usize) {
        self.replayed_frames
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Get journal uptime in seconds.
    pub fn uptime_secs(&self) -> f64 {
        self.opened_at.elapsed().as_secs_f64()
    }

    /// Get total number of operations (puts + gets + deletes + scans).
    pub fn total_ops(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
            + self.gets.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
            + self.range_scans.load(Ordering::Relaxed)
            + self.history_scans.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ WAYBILL Journal Metrics ═══\n\
             Operations:\n\
               puts:          {}\n\
               gets:          {}\n\
               deletes:       {}\n\
               range scans:   {}\n\
               history scans: {}\n\
               total ops:     {}\n\
             I/O:\n\
               written:       {} bytes\n\
               read:          {} bytes\n\
             Recovery:\n\
               replayed:      {} frames\n\
             Uptime: {:.2}s",
            self.puts.load(Ordering::Relaxed),
            self.gets.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.range_scans.load(Ordering::Relaxed),
            self.history_scans.load(Ordering::Relaxed),
            self.total_ops(),
            self.bytes_written.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed),
            self.replayed_frames.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for LedgerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
