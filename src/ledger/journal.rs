//! WAYBILL - Journal
//! Single-node, crash-recoverable implementation of [`Ledger`].
//!
//! ## Concurrency Model
//! - **Read operations** (`get`, `range_scan`, `history_scan`) take a **read lock** (shared)
//! - **Write operations** (`put`, `mark_deleted`) take a **write lock** (exclusive)
//! - A poisoned lock is reported as [`LedgerError::Unavailable`]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{KeyValue, Value, Version};

use super::cursor::{Cursor, CursorLease};
use super::index::VersionIndex;
use super::metrics::LedgerMetrics;
use super::wal::WriteAheadLog;
use super::Ledger;

struct Inner {
    /// Every version of every key.
    index: VersionIndex,
    /// Write-ahead log for crash recovery.
    wal: WriteAheadLog,
}

/// Append-only versioned key-value store.
/// Coordinates the version index and the WAL; history is never erased.
pub struct Journal {
    inner: RwLock<Inner>,
    metrics: LedgerMetrics,
    /// Cursors handed out and not yet dropped.
    open_cursors: Arc<AtomicUsize>,
}

impl Journal {
    /// Open or create a journal at the configured path, replaying its WAL.
    pub fn open(config: Config) -> LedgerResult<Self> {
        config.ensure_dirs()?;

        let wal_path = config.wal_path();
        let recovered = WriteAheadLog::recover(&wal_path)?;
        let wal = WriteAheadLog::open(wal_path, config.sync_writes)?;

        log::info!(
            "Journal opened at {:?} ({} frames replayed, {} live keys)",
            config.data_dir,
            recovered.frames,
            recovered.index.len()
        );

        let metrics = LedgerMetrics::new();
        metrics.record_replay(recovered.frames);

        Ok(Self {
            inner: RwLock::new(Inner {
                index: recovered.index,
                wal,
            }),
            metrics,
            open_cursors: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn read_inner(&self) -> LedgerResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Unavailable("journal lock poisoned".into()))
    }

    fn write_inner(&self) -> LedgerResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Unavailable("journal lock poisoned".into()))
    }

    /// Write path: WAL (disk) -> index (memory).
    fn append(&self, key: &[u8], version: Version) -> LedgerResult<()> {
        let mut inner = self.write_inner()?;
        inner.wal.append(key, &version)?;
        inner.index.append(key.to_vec(), version);
        Ok(())
    }

    /// Number of live keys.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read_inner()?.index.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.read_inner()?.index.is_empty())
    }

    /// Number of versions ever appended, tombstones included.
    pub fn version_count(&self) -> LedgerResult<usize> {
        Ok(self.read_inner()?.index.version_count())
    }

    /// Cursors currently handed out and not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }
}

impl Ledger for Journal {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Value>> {
        let value = self.read_inner()?.index.latest(key).cloned();
        self.metrics.record_get(value.as_ref().map(|v| v.len()));
        Ok(value)
    }

    fn put(&self, tx_id: &str, key: &[u8], value: Value) -> LedgerResult<()> {
        let value_len = value.len();
        self.append(key, Version::put(tx_id, value))?;
        self.metrics.record_put(key.len(), value_len);
        Ok(())
    }

    fn mark_deleted(&self, tx_id: &str, key: &[u8]) -> LedgerResult<()> {
        self.append(key, Version::delete(tx_id))?;
        self.metrics.record_delete(key.len());
        Ok(())
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> LedgerResult<Cursor<'_, KeyValue>> {
        let rows = self.read_inner()?.index.live_range(start, end);
        self.metrics.record_range_scan();
        log::debug!("range cursor opened over {} live keys", rows.len());
        Ok(Cursor::with_lease(
            rows.into_iter().map(Ok),
            CursorLease::acquire(&self.open_cursors),
        ))
    }

    fn history_scan(&self, key: &[u8]) -> LedgerResult<Cursor<'_, Version>> {
        let rows = self.read_inner()?.index.history(key);
        self.metrics.record_history_scan();
        Ok(Cursor::with_lease(
            rows.into_iter().map(Ok),
            CursorLease::acquire(&self.open_cursors),
        ))
    }
}
