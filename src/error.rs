//! WAYBILL - Custom Error Types
//! Defines the error hierarchy for the journal and the record layer.

use std::fmt;

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a ledger implementation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// I/O errors from the write-ahead log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAL payload serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (CRC mismatch).
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// The ledger cannot serve the request (poisoned lock, cancelled call).
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

/// The record operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exists,
    Create,
    Read,
    Update,
    Delete,
    EnumerateAll,
    GetHistory,
    Seed,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Exists => "exists",
            Op::Create => "create",
            Op::Read => "read",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::EnumerateAll => "enumerate_all",
            Op::GetHistory => "get_history",
            Op::Seed => "seed",
        };
        f.write_str(name)
    }
}

/// Fieldless classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Encoding,
    Storage,
    InvalidKey,
}

/// Errors raised by the record layer.
///
/// Every variant names the operation, the record kind and the key, so the
/// caller can log it and decide on abort or retry.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No live record under the key.
    #[error("{op}: the {kind} {key:?} does not exist")]
    NotFound {
        op: Op,
        kind: &'static str,
        key: String,
    },

    /// Create targeted a key that already holds a live record.
    #[error("{op}: the {kind} {key:?} already exists")]
    AlreadyExists {
        op: Op,
        kind: &'static str,
        key: String,
    },

    /// Malformed stored bytes, or a record that failed to serialize.
    #[error("{op}: failed to encode or decode {kind} {key:?}: {source}")]
    Encoding {
        op: Op,
        kind: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The underlying ledger call failed.
    #[error("{op}: ledger failure for {kind} {key:?}: {source}")]
    Storage {
        op: Op,
        kind: &'static str,
        key: String,
        #[source]
        source: LedgerError,
    },

    /// Empty key, or a record whose key field differs from the lookup key.
    #[error("{op}: invalid {kind} key {key:?}: {reason}")]
    InvalidKey {
        op: Op,
        kind: &'static str,
        key: String,
        reason: String,
    },
}

impl StoreError {
    pub fn not_found(op: Op, kind: &'static str, key: &str) -> Self {
        StoreError::NotFound {
            op,
            kind,
            key: key.to_string(),
        }
    }

    pub fn already_exists(op: Op, kind: &'static str, key: &str) -> Self {
        StoreError::AlreadyExists {
            op,
            kind,
            key: key.to_string(),
        }
    }

    pub fn encoding(op: Op, kind: &'static str, key: &str, source: serde_json::Error) -> Self {
        StoreError::Encoding {
            op,
            kind,
            key: key.to_string(),
            source,
        }
    }

    pub fn storage(op: Op, kind: &'static str, key: &str, source: LedgerError) -> Self {
        StoreError::Storage {
            op,
            kind,
            key: key.to_string(),
            source,
        }
    }

    pub fn invalid_key(op: Op, kind: &'static str, key: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidKey {
            op,
            kind,
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::Encoding { .. } => ErrorKind::Encoding,
            StoreError::Storage { .. } => ErrorKind::Storage,
            StoreError::InvalidKey { .. } => ErrorKind::InvalidKey,
        }
    }

    pub fn op(&self) -> Op {
        match self {
            StoreError::NotFound { op, .. }
            | StoreError::AlreadyExists { op, .. }
            | StoreError::Encoding { op, .. }
            | StoreError::Storage { op, .. }
            | StoreError::InvalidKey { op, .. } => *op,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StoreError::NotFound { key, .. }
            | StoreError::AlreadyExists { key, .. }
            | StoreError::Encoding { key, .. }
            | StoreError::Storage { key, .. }
            | StoreError::InvalidKey { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_op_and_key() {
        let err = StoreError::NotFound {
            op: Op::Read,
            kind: "order",
            key: "ordr_9".into(),
        };
        assert_eq!(err.to_string(), "read: the order \"ordr_9\" does not exist");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.op(), Op::Read);
        assert_eq!(err.key(), "ordr_9");
    }

    #[test]
    fn test_storage_wraps_ledger_error() {
        let err = StoreError::Storage {
            op: Op::Exists,
            kind: "order",
            key: "k".into(),
            source: LedgerError::Unavailable("cancelled".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("cancelled"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
