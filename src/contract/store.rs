//! WAYBILL - Record Store
//! Existence-gated create/read/update/delete of records over a [`Ledger`].
//!
//! Every mutating call issues at most one ledger write, and only after its
//! existence check has passed, so a failed call leaves the ledger untouched.

use std::marker::PhantomData;

use crate::audit::AuditLog;
use crate::error::{Op, Result, StoreError};
use crate::ledger::Ledger;

use super::record::{self, Order, Record};
use super::TxContext;

/// CRUD over records of type `R`, each stored under its own key.
pub struct RecordStore<'l, L: ?Sized, R = Order> {
    ledger: &'l L,
    audit: AuditLog,
    _record: PhantomData<fn() -> R>,
}

impl<'l, L, R> RecordStore<'l, L, R>
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

    fn check_key(op: Op, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::invalid_key(op, R::KIND, key, "key must not be empty"));
        }
        Ok(())
    }

    /// The key field is immutable and must name the record it is stored under.
    fn check_record_key(op: Op, key: &str, record: &R) -> Result<()> {
        Self::check_key(op, key)?;
        if record.key() != key {
            return Err(StoreError::invalid_key(
                op,
                R::KIND,
                key,
                format!("record key field is {:?}", record.key()),
            ));
        }
        Ok(())
    }

    fn begin(&self, ctx: &TxContext, op: Op, key: &str) {
        self.audit.info(format_args!(
            "{} {} {:?} (tx {}, caller {})",
            op,
            R::KIND,
            key,
            ctx.tx_id(),
            ctx.caller()
        ));
    }

    fn reject(&self, ctx: &TxContext, err: StoreError) -> StoreError {
        self.audit
            .warn(format_args!("tx {}: {}", ctx.tx_id(), err));
        err
    }

    fn is_live(&self, op: Op, key: &str) -> Result<bool> {
        let value = self
            .ledger
            .get(key.as_bytes())
            .map_err(|e| StoreError::storage(op, R::KIND, key, e))?;
        Ok(value.is_some())
    }

    /// Whether a live record is stored under `key`.
    pub fn exists(&self, ctx: &TxContext, key: &str) -> Result<bool> {
        Self::check_key(Op::Exists, key)?;
        let live = self.is_live(Op::Exists, key)?;
        self.audit.debug(format_args!(
            "exists {} {:?} = {} (tx {})",
            R::KIND,
            key,
            live,
            ctx.tx_id()
        ));
        Ok(live)
    }

    /// Store `record` under `key`. Fails with `AlreadyExists` if `key` is live.
    pub fn create(&self, ctx: &TxContext, key: &str, record: &R) -> Result<()> {
        let op = Op::Create;
        self.begin(ctx, op, key);
        Self::check_record_key(op, key, record).map_err(|e| self.reject(ctx, e))?;

        if self.is_live(op, key)? {
            return Err(self.reject(ctx, StoreError::already_exists(op, R::KIND, key)));
        }

        let bytes = record::encode(record).map_err(|e| StoreError::encoding(op, R::KIND, key, e))?;
        self.ledger
            .put(ctx.tx_id(), key.as_bytes(), bytes)
            .map_err(|e| StoreError::storage(op, R::KIND, key, e))?;

        self.audit
            .info(format_args!("{} {:?} created successfully", R::KIND, key));
        Ok(())
    }

    /// The latest live record under `key`.
    pub fn read(&self, ctx: &TxContext, key: &str) -> Result<R> {
        let op = Op::Read;
        self.begin(ctx, op, key);
        Self::check_key(op, key)?;

        let bytes = self
            .ledger
            .get(key.as_bytes())
            .map_err(|e| StoreError::storage(op, R::KIND, key, e))?
            .ok_or_else(|| self.reject(ctx, StoreError::not_found(op, R::KIND, key)))?;
        let record = record::decode(&bytes).map_err(|e| StoreError::encoding(op, R::KIND, key, e))?;

        self.audit
            .info(format_args!("queried the {} {:?} successfully", R::KIND, key));
        Ok(record)
    }

    /// Replace the live record under `key`. Fails with `NotFound` if absent.
    pub fn update(&self, ctx: &TxContext, key: &str, record: &R) -> Result<()> {
        let op = Op::Update;
        self.begin(ctx, op, key);
        Self::check_record_key(op, key, record).map_err(|e| self.reject(ctx, e))?;

        if !self.is_live(op, key)? {
            return Err(self.reject(ctx, StoreError::not_found(op, R::KIND, key)));
        }

        let bytes = record::encode(record).map_err(|e| StoreError::encoding(op, R::KIND, key, e))?;
        self.ledger
            .put(ctx.tx_id(), key.as_bytes(), bytes)
            .map_err(|e| StoreError::storage(op, R::KIND, key, e))?;

        self.audit
            .info(format_args!("{} {:?} updated successfully", R::KIND, key));
        Ok(())
    }

    /// Tombstone the live record under `key`. Its history is kept.
    pub fn delete(&self, ctx: &TxContext, key: &str) -> Result<()> {
        let op = Op::Delete;
        self.begin(ctx, op, key);
        Self::check_key(op, key)?;

        if !self.is_live(op, key)? {
            return Err(self.reject(ctx, StoreError::not_found(op, R::KIND, key)));
        }

        self.ledger
            .mark_deleted(ctx.tx_id(), key.as_bytes())
            .map_err(|e| StoreError::storage(op, R::KIND, key, e))?;

        self.audit
            .info(format_args!("{} {:?} deleted successfully", R::KIND, key));
        Ok(())
    }

    /// Write every record under its own key with no existence gate,
    /// overwriting live values. Stops at the first failure.
    pub fn seed(&self, ctx: &TxContext, records: &[R]) -> Result<()> {
        let op = Op::Seed;
        for record in records {
            let key = record.key();
            Self::check_key(op, key)?;
            let bytes = record::encode(record).map_err(|e| StoreError::encoding(op, R::KIND, key, e))?;
            self.ledger
                .put(ctx.tx_id(), key.as_bytes(), bytes)
                .map_err(|e| StoreError::storage(op, R::KIND, key, e))?;
        }
        self.audit.info(format_args!(
            "seeded {} {} records (tx {}, caller {})",
            records.len(),
            R::KIND,
            ctx.tx_id(),
            ctx.caller()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::ledger::Journal;

    fn temp_journal() -> (tempfile::TempDir, Journal) {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
        (dir, journal)
    }

    fn order(key: &str, track: &str) -> Order {
        Order {
            order_no: key.into(),
            date: "2024-03-01".into(),
            order_detail: "two pallets".into(),
            invoice: "INV-001".into(),
            packing_status: "Packing".into(),
            payment_method: "Cash".into(),
            order_track: track.into(),
        }
    }

    fn ctx() -> TxContext {
        TxContext::new("tx-test", "tester")
    }

    #[test]
    fn test_create_then_read() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        store.create(&ctx(), "k1", &order("k1", "In Progress")).unwrap();
        assert_eq!(store.read(&ctx(), "k1").unwrap(), order("k1", "In Progress"));
        assert!(store.exists(&ctx(), "k1").unwrap());
    }

    #[test]
    fn test_double_create_rejected() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        store.create(&ctx(), "k1", &order("k1", "first")).unwrap();
        let err = store.create(&ctx(), "k1", &order("k1", "second")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.read(&ctx(), "k1").unwrap().order_track, "first");
        assert_eq!(journal.version_count().unwrap(), 1);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        let err = store.update(&ctx(), "k1", &order("k1", "x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(journal.version_count().unwrap(), 0);
    }

    #[test]
    fn test_update_replaces_value() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        store.create(&ctx(), "k1", &order("k1", "f1")).unwrap();
        store.update(&ctx(), "k1", &order("k1", "f2")).unwrap();
        assert_eq!(store.read(&ctx(), "k1").unwrap().order_track, "f2");
    }

    #[test]
    fn test_update_rejects_mismatched_key_field() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        store.create(&ctx(), "k1", &order("k1", "f1")).unwrap();
        let err = store.update(&ctx(), "k1", &order("k2", "f2")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert_eq!(store.read(&ctx(), "k1").unwrap().order_track, "f1");
    }

    #[test]
    fn test_delete_then_read() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        store.create(&ctx(), "k1", &order("k1", "f1")).unwrap();
        store.delete(&ctx(), "k1").unwrap();
        assert_eq!(store.read(&ctx(), "k1").unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!store.exists(&ctx(), "k1").unwrap());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        let err = store.delete(&ctx(), "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.op(), Op::Delete);
    }

    #[test]
    fn test_empty_key_rejected() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        assert_eq!(store.exists(&ctx(), "").unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(
            store.create(&ctx(), "", &order("", "x")).unwrap_err().kind(),
            ErrorKind::InvalidKey
        );
    }

    #[test]
    fn test_corrupt_value_is_encoding_error() {
        let (_dir, journal) = temp_journal();
        journal.put("tx0", b"bad", b"{not json".to_vec()).unwrap();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());

        let err = store.read(&ctx(), "bad").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.key(), "bad");
    }

    #[test]
    fn test_exists_is_stable() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());
        store.create(&ctx(), "k1", &order("k1", "f1")).unwrap();

        for _ in 0..5 {
            assert!(store.exists(&ctx(), "k1").unwrap());
            assert!(!store.exists(&ctx(), "k2").unwrap());
        }
    }

    #[test]
    fn test_seed_overwrites() {
        let (_dir, journal) = temp_journal();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::default());
        store.create(&ctx(), "k1", &order("k1", "old")).unwrap();

        store
            .seed(&ctx(), &[order("k1", "new"), order("k2", "fresh")])
            .unwrap();
        assert_eq!(store.read(&ctx(), "k1").unwrap().order_track, "new");
        assert_eq!(store.read(&ctx(), "k2").unwrap().order_track, "fresh");
    }

    #[test]
    fn test_audit_lines_carry_tx_and_caller() {
        let (_dir, journal) = temp_journal();
        let sink = MemorySink::new();
        let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::new(sink.clone(), "orders"));

        store
            .create(&TxContext::new("tx-42", "alice"), "k1", &order("k1", "f1"))
            .unwrap();

        let messages = sink.messages();
        assert!(messages[0].contains("tx-42"));
        assert!(messages[0].contains("alice"));
        assert!(messages.iter().any(|m| m.contains("created successfully")));
    }
}
