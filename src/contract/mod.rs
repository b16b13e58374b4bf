//! WAYBILL - Record Layer
//! Existence-gated records, range enumeration and history replay over a
//! [`Ledger`](crate::ledger::Ledger).
//!
//! Each component borrows the ledger and is given its
//! [`AuditLog`](crate::audit::AuditLog) when it
//! is built. None of them holds state between calls.

pub mod history;
pub mod payment;
pub mod record;
pub mod scanner;
pub mod store;

use crate::error::Result;
use crate::ledger::Ledger;

pub use self::history::{History, HistoryReconstructor};
pub use self::payment::{PaymentError, PaymentTransaction, Shipment, TransactionType};
pub use self::record::{HistoryEntry, Order, QueryResult, Record};
pub use self::scanner::{RangeScanner, Records};
pub use self::store::RecordStore;

/// The transaction a record operation runs in.
///
/// The caller identity is recorded in audit lines only; no operation checks
/// it against any policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    tx_id: String,
    caller: String,
}

impl TxContext {
    pub fn new(tx_id: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            caller: caller.into(),
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }
}

/// The two sample orders loaded by [`seed_orders`].
pub fn sample_orders() -> Vec<Order> {
    vec![
        Order {
            order_no: "logis_ordr_1".into(),
            date: "2024-03-01".into(),
            order_detail: "Sample order details 1".into(),
            invoice: "INV-001".into(),
            packing_status: "Packing".into(),
            payment_method: "Credit Card".into(),
            order_track: "In Progress".into(),
        },
        Order {
            order_no: "logis_ordr_2".into(),
            date: "2024-03-02".into(),
            order_detail: "Sample order details 2".into(),
            invoice: "INV-002".into(),
            packing_status: "Packing".into(),
            payment_method: "Cash".into(),
            order_track: "Shipped".into(),
        },
    ]
}

/// Load [`sample_orders`], overwriting whatever those keys hold.
pub fn seed_orders<L: Ledger + ?Sized>(store: &RecordStore<'_, L, Order>, ctx: &TxContext) -> Result<()> {
    store.seed(ctx, &sample_orders())
}
