//! WAYBILL - Range Scanner
//! Lazy enumeration of every live record in the ledger's key space.

use std::marker::PhantomData;

use crate::audit::AuditLog;
use crate::error::{Op, Result, StoreError};
use crate::ledger::{Cursor, Ledger};
use crate::types::KeyValue;

use super::record::{self, Order, QueryResult, Record};
use super::TxContext;

/// Enumerates live records of type `R` in raw key byte order.
pub struct RangeScanner<'l, L: ?Sized, R = Order> {
    ledger: &'l L,
    audit: AuditLog,
    _record: PhantomData<fn() -> R>,
}

impl<'l, L, R> RangeScanner<'l, L, R>
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

    /// Open a fresh cursor over the full key range.
    ///
    /// The returned iterator yields one `QueryResult` per live key. The first
    /// error (a ledger failure or an undecodable value) is yielded once and
    /// ends the iteration; nothing is skipped.
    pub fn enumerate_all(&self, ctx: &TxContext) -> Result<Records<'l, R>> {
        self.audit.info(format_args!(
            "enumerating all {} records (tx {}, caller {})",
            R::KIND,
            ctx.tx_id(),
            ctx.caller()
        ));
        let cursor = self
            .ledger
            .range_scan(b"", b"")
            .map_err(|e| StoreError::storage(Op::EnumerateAll, R::KIND, "", e))?;
        Ok(Records {
            cursor: Some(cursor),
            yielded: 0,
            audit: self.audit.clone(),
            _record: PhantomData,
        })
    }

    /// Drain [`enumerate_all`](Self::enumerate_all) into a vector.
    pub fn collect_all(&self, ctx: &TxContext) -> Result<Vec<QueryResult<R>>> {
        self.enumerate_all(ctx)?.collect()
    }
}

/// Iterator returned by [`RangeScanner::enumerate_all`].
///
/// The ledger cursor is dropped as soon as the scan ends or fails, and in
/// any case when this iterator is dropped.
pub struct Records<'l, R> {
    cursor: Option<Cursor<'l, KeyValue>>,
    yielded: usize,
    audit: AuditLog,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Records<'_, R> {
    fn step(cursor: &mut Cursor<'_, KeyValue>) -> Option<Result<QueryResult<R>>> {
        let row = match cursor.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(StoreError::storage(Op::EnumerateAll, R::KIND, "", e))),
        };
        let key = String::from_utf8_lossy(&row.key).into_owned();
        Some(match record::decode(&row.value) {
            Ok(record) => Ok(QueryResult { key, record }),
            Err(e) => Err(StoreError::encoding(Op::EnumerateAll, R::KIND, &key, e)),
        })
    }
}

impl<R: Record> Iterator for Records<'_, R> {
    type Item = Result<QueryResult<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        match Self::step(cursor) {
            Some(Ok(result)) => {
                self.yielded += 1;
                Some(Ok(result))
            }
            Some(Err(err)) => {
                self.cursor = None;
                self.audit.warn(format_args!("enumeration aborted: {}", err));
                Some(Err(err))
            }
            None => {
                self.cursor = None;
                self.audit.info(format_args!(
                    "all {} records queried successfully ({})",
                    R::KIND,
                    self.yielded
                ));
                None
            }
        }
    }
}
