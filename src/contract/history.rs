//! WAYBILL - History Reconstructor
//! Replays a key's append log into point-in-time record snapshots.
//!
//! Entries come out in the order the ledger reports them, which for every
//! [`Ledger`] is newest first. Nothing is re-sorted here: a tombstone's
//! empty snapshot is only meaningful because the value it deleted is the
//! next, strictly older, entry.

use std::marker::PhantomData;

use crate::audit::AuditLog;
use crate::error::{Op, Result, StoreError};
use crate::ledger::{Cursor, Ledger};
use crate::types::Version;

use super::record::{self, HistoryEntry, Order, Record};
use super::TxContext;

/// Rebuilds the version history of records of type `R`, one key at a time.
pub struct HistoryReconstructor<'l, L: ?Sized, R = Order> {
    ledger: &'l L,
    audit: AuditLog,
    _record: PhantomData<fn() -> R>,
}

impl<'l, L, R> HistoryReconstructor<'l, L, R>
where
    L: Ledger + ?Sized,
    R: Record,
{
    pub fn new(ledger: &'l L, audit: AuditLog) -> Self {
        Self {
            ledger,
            audit,
            _record: PhantomData,
        }
    }

    /// Open a history cursor for `key`.
    ///
    /// A key that was never written yields an empty history, not `NotFound`.
    pub fn get_history(&self, ctx: &TxContext, key: &str) -> Result<History<'l, R>> {
        if key.is_empty() {
            let err = StoreError::invalid_key(Op::GetHistory, R::KIND, key, "key must not be empty");
            self.audit.warn(format_args!("tx {}: {}", ctx.tx_id(), err));
            return Err(err);
        }
        self.audit.info(format_args!(
            "retrieving history for {} {:?} (tx {}, caller {})",
            R::KIND,
            key,
            ctx.tx_id(),
            ctx.caller()
        ));
        let cursor = self
            .ledger
            .history_scan(key.as_bytes())
            .map_err(|e| StoreError::storage(Op::GetHistory, R::KIND, key, e))?;
        Ok(History {
            key: key.to_string(),
            cursor: Some(cursor),
            audit: self.audit.clone(),
            _record: PhantomData,
        })
    }

    /// Drain [`get_history`](Self::get_history) into a vector.
    pub fn collect_history(&self, ctx: &TxContext, key: &str) -> Result<Vec<HistoryEntry<R>>> {
        self.get_history(ctx, key)?.collect()
    }
}

/// Iterator returned by [`HistoryReconstructor::get_history`].
pub struct History<'l, R> {
    key: String,
    cursor: Option<Cursor<'l, Version>>,
    audit: AuditLog,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> History<'_, R> {
    fn replay(&self, version: Version) -> Result<HistoryEntry<R>> {
        let record = match &version.value {
            None => R::default(),
            Some(bytes) => record::decode(bytes)
                .map_err(|e| StoreError::encoding(Op::GetHistory, R::KIND, &self.key, e))?,
        };
        Ok(HistoryEntry {
            is_delete: version.is_tombstone(),
            tx_id: version.tx_id,
            timestamp: version.timestamp,
            record,
        })
    }
}

impl<R: Record> Iterator for History<'_, R> {
    type Item = Result<HistoryEntry<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.cursor.as_mut()?.next();
        let item = match row {
            None => {
                self.cursor = None;
                self.audit.info(format_args!(
                    "history retrieved successfully for {} {:?}",
                    R::KIND,
                    self.key
                ));
                return None;
            }
            Some(Ok(version)) => self.replay(version),
            Some(Err(e)) => Err(StoreError::storage(Op::GetHistory, R::KIND, &self.key, e)),
        };
        if let Err(err) = &item {
            self.cursor = None;
            self.audit.warn(format_args!("history aborted: {}", err));
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::config::Config;
    use crate::contract::RecordStore;
    use crate::error::ErrorKind;
    use crate::ledger::Journal;

    fn temp_journal() -> (tempfile::TempDir, Journal) {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
        (dir, journal)
    }

    fn order(track: &str) -> Order {
        Order {
            order_no: "k1".into(),
            order_track: track.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_update_delete_history() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());
        store.create(&TxContext::new("t1", "u"), "k1", &order("f1")).unwrap();
        store.update(&TxContext::new("t2", "u"), "k1", &order("f2")).unwrap();
        store.delete(&TxContext::new("t3", "u"), "k1").unwrap();

        let history: HistoryReconstructor<_> = HistoryReconstructor::new(&journal, AuditLog::default());
        let entries = history
            .collect_history(&TxContext::new("t4", "u"), "k1")
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_delete);
        assert_eq!(entries[0].record, Order::default());
        assert_eq!(entries[0].tx_id, "t3");
        assert!(!entries[1].is_delete);
        assert_eq!(entries[1].record, order("f2"));
        assert_eq!(entries[2].record, order("f1"));
        assert!(entries[0].timestamp >= entries[2].timestamp);
        assert_eq!(journal.open_cursors(), 0);
    }

    #[test]
    fn test_unknown_key_has_empty_history() {
        let (_dir, journal) = temp_journal();
        let history: HistoryReconstructor<_> = HistoryReconstructor::new(&journal, AuditLog::default());
        let entries = history
            .collect_history(&TxContext::new("t", "u"), "ghost")
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_empty_key_rejected_and_logged() {
        let (_dir, journal) = temp_journal();
        let sink = MemorySink::new();
        let history: HistoryReconstructor<_> =
            HistoryReconstructor::new(&journal, AuditLog::new(sink.clone(), "orders"));

        let err = history
            .get_history(&TxContext::new("tx-h", "u"), "")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, log::Level::Warn);
        assert!(lines[0].2.starts_with("tx tx-h:"));
        assert_eq!(journal.open_cursors(), 0);
    }

    #[test]
    fn test_corrupt_version_fails_history() {
        let (_dir, journal) = temp_journal();
        journal.put("t1", b"k1", b"{]".to_vec()).unwrap();
        journal.mark_deleted("t2", b"k1").unwrap();

        let history: HistoryReconstructor<_> = HistoryReconstructor::new(&journal, AuditLog::default());
        let mut entries = history.get_history(&TxContext::new("t", "u"), "k1").unwrap();
        assert!(entries.next().unwrap().unwrap().is_delete);
        let err = entries.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(journal.open_cursors(), 0);
        assert!(entries.next().is_none());
    }
}
