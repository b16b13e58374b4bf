//! WAYBILL - Scoped Ledger Cursors
//! Iterators handed out by `range_scan` and `history_scan`.
//!
//! A cursor owns whatever ledger-side resource backs it. The resource is
//! released when the cursor is dropped, so every exit path (exhaustion, an
//! early `return`, a propagated `?`) gives it back.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::LedgerResult;

/// Counts one open cursor against a shared gauge for as long as it lives.
#[derive(Debug)]
pub struct CursorLease {
    open: Arc<AtomicUsize>,
}

impl CursorLease {
    /// Take a lease, incrementing `open`.
    pub fn acquire(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::AcqRel);
        Self {
            open: Arc::clone(open),
        }
    }
}

impl Drop for CursorLease {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A finite, non-restartable stream of ledger rows.
pub struct Cursor<'a, T> {
    rows: Box<dyn Iterator<Item = LedgerResult<T>> + 'a>,
    _lease: Option<CursorLease>,
}

impl<'a, T> Cursor<'a, T> {
    /// Wrap an iterator that needs no release bookkeeping.
    pub fn new(rows: impl Iterator<Item = LedgerResult<T>> + 'a) -> Self {
        Self {
            rows: Box::new(rows),
            _lease: None,
        }
    }

    /// Wrap an iterator and hold `lease` until the cursor is dropped.
    pub fn with_lease(rows: impl Iterator<Item = LedgerResult<T>> + 'a, lease: CursorLease) -> Self {
        Self {
            rows: Box::new(rows),
            _lease: Some(lease),
        }
    }
}

impl<T> Iterator for Cursor<'_, T> {
    type Item = LedgerResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("leased", &self._lease.is_some())
            .finish()
    }
}
