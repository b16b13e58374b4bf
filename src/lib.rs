//! WAYBILL - Order Records over a Versioned Ledger
//!
//! Existence-gated records stored in an append-only, versioned key-value
//! ledger, with full per-key change history.
//!
//! ## Components
//! - **Record Store**: create/read/update/delete gated on whether a live record exists
//! - **Range Scanner**: lazy enumeration of every live record, in key order
//! - **History Reconstructor**: a key's versions and tombstones, newest first
//! - **Journal**: single-node ledger with a CRC-checked write-ahead log
//!
//! ## Example
//! ```no_run
//! use waybill::audit::AuditLog;
//! use waybill::config::Config;
//! use waybill::contract::{Order, RecordStore, TxContext};
//! use waybill::ledger::Journal;
//!
//! let journal = Journal::open(Config::default()).unwrap();
//! let store: RecordStore<_> = RecordStore::new(&journal, AuditLog::global("waybill::orders"));
//! let ctx = TxContext::new("tx-1", "clerk");
//!
//! let order = Order { order_no: "ordr_1".into(), ..Default::default() };
//! store.create(&ctx, "ordr_1", &order).unwrap();
//! assert_eq!(store.read(&ctx, "ordr_1").unwrap(), order);
//! ```

pub mod audit;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod types;
