//! WAYBILL - Ledger Module
//! The append-only, versioned key-value ledger the record layer is built on.
//!
//! The [`Ledger`] trait is the only surface the record layer touches. The
//! [`Journal`] is the bundled single-node implementation: a version index in
//! memory, made durable by a CRC-checked write-ahead log.

pub mod cursor;
pub mod index;
pub mod journal;
pub mod metrics;
pub mod wal;

use crate::error::LedgerResult;
use crate::types::{KeyValue, Value, Version};

pub use self::cursor::{Cursor, CursorLease};
pub use self::journal::Journal;

/// An ordered, versioned key-value ledger.
///
/// Implementations must be linearizable per key. Writes never erase history:
/// `put` and `mark_deleted` each append one version to the key's log.
pub trait Ledger {
    /// Latest value for `key`, or `None` if absent or tombstoned.
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Value>>;

    /// Append a new value for `key` on behalf of transaction `tx_id`.
    fn put(&self, tx_id: &str, key: &[u8], value: Value) -> LedgerResult<()>;

    /// Append a tombstone for `key` on behalf of transaction `tx_id`.
    fn mark_deleted(&self, tx_id: &str, key: &[u8]) -> LedgerResult<()>;

    /// Live entries with `start <= key < end`, ascending by raw key bytes.
    /// An empty bound is open.
    fn range_scan(&self, start: &[u8], end: &[u8]) -> LedgerResult<Cursor<'_, KeyValue>>;

    /// Every version ever written for `key`, newest first.
    fn history_scan(&self, key: &[u8]) -> LedgerResult<Cursor<'_, Version>>;
}
