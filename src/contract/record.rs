//! WAYBILL - Records and their Encoding
//! The record types stored in the ledger and the JSON codec they share.

use serde::de::DeserializeOwned;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// A flat, string-keyed document stored under its own key.
///
/// The key field's value is the ledger key. `Default` is the empty record
/// reported for tombstones in a history.
pub trait Record: Serialize + DeserializeOwned + Default + Clone + PartialEq + std::fmt::Debug {
    /// Human-readable kind, used in errors, log lines and as the snapshot's
    /// field name in a serialized [`HistoryEntry`].
    const KIND: &'static str;

    /// The record's key field.
    fn key(&self) -> &str;
}

/// Serialize a record into its canonical stored form.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(record)
}

/// Deserialize a record from its stored form.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// A logistics order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_no: String,
    pub date: String,
    pub order_detail: String,
    pub invoice: String,
    pub packing_status: String,
    pub payment_method: String,
    pub order_track: String,
}

impl Record for Order {
    const KIND: &'static str = "order";

    fn key(&self) -> &str {
        &self.order_no
    }
}

/// One live record from a range enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<R> {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: R,
}

/// One point-in-time version of a record.
///
/// For a deletion `is_delete` is set and `record` is `R::default()`; the
/// value that was deleted is the next (older) entry of the history.
///
/// Serialized as `{"txId", "timestamp", "isDelete", <R::KIND>}`, so an order
/// history carries its snapshot under `"order"`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<R> {
    pub tx_id: String,
    /// Microseconds since the Unix epoch.
    pub timestamp: u64,
    pub is_delete: bool,
    pub record: R,
}

impl<R: Record> Serialize for HistoryEntry<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entry = serializer.serialize_struct("HistoryEntry", 4)?;
        entry.serialize_field("txId", &self.tx_id)?;
        entry.serialize_field("timestamp", &self.timestamp)?;
        entry.serialize_field("isDelete", &self.is_delete)?;
        entry.serialize_field(R::KIND, &self.record)?;
        entry.end()
    }
}
