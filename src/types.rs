//! WAYBILL - Core Type Definitions
//! Defines the ledger-level types shared by the journal and the record layer.

/// Ledger key. Arbitrary bytes; record keys are their UTF-8 encoding.
pub type Key = Vec<u8>;

/// Ledger value. Arbitrary bytes; records store their JSON encoding.
pub type Value = Vec<u8>;

/// Microseconds since the Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

/// A single immutable version of a key in the ledger's append log.
/// A `None` value indicates a tombstone (deletion marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub tx_id: String,
    pub timestamp: u64,
    pub value: Option<Value>,
}

impl Version {
    /// Create a version carrying a value (PUT operation).
    pub fn put(tx_id: impl Into<String>, value: Value) -> Self {
        Self {
            tx_id: tx_id.into(),
            value: Some(value),
            timestamp: now_micros(),
        }
    }

    /// Create a tombstone version (DELETE operation).
    pub fn delete(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            value: None,
            timestamp: now_micros(),
        }
    }

    /// Returns true if this version is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// A live key and its latest value, as produced by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Key,
    pub value: Value,
}
