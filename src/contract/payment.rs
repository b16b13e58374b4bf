//! WAYBILL - Payments and Shipments
//! Record kinds kept alongside orders: payment transactions and carrier
//! shipment tracking. Both go through the same [`RecordStore`](super::RecordStore).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::Record;

/// Errors building a [`PaymentTransaction`] from raw input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("unknown transaction type {0:?} (expected \"ACH\" or \"CreditCard\")")]
    UnknownType(String),

    #[error("transaction amount must be finite, got {0}")]
    NonFiniteAmount(f64),
}

/// How a payment was settled. Closed set: unknown tags are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[default]
    #[serde(rename = "ACH")]
    Ach,
    #[serde(rename = "CreditCard")]
    CreditCard,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Ach => "ACH",
            TransactionType::CreditCard => "CreditCard",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACH" => Ok(TransactionType::Ach),
            "CreditCard" => Ok(TransactionType::CreditCard),
            other => Err(PaymentError::UnknownType(other.to_string())),
        }
    }
}

/// A payment recorded against an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub account: String,
    pub transaction_details: String,
}

impl PaymentTransaction {
    /// Validate raw input. The amount must be finite so it survives JSON.
    pub fn new(
        id: impl Into<String>,
        kind: &str,
        amount: f64,
        account: impl Into<String>,
        transaction_details: impl Into<String>,
    ) -> Result<Self, PaymentError> {
        if !amount.is_finite() {
            return Err(PaymentError::NonFiniteAmount(amount));
        }
        Ok(Self {
            id: id.into(),
            kind: kind.parse()?,
            amount,
            account: account.into(),
            transaction_details: transaction_details.into(),
        })
    }
}

impl Record for PaymentTransaction {
    const KIND: &'static str = "transaction";

    fn key(&self) -> &str {
        &self.id
    }
}

/// Carrier tracking data for a shipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub shipment_id: String,
    pub tracking_url: String,
}

impl Record for Shipment {
    const KIND: &'static str = "shipment";

    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::config::Config;
    use crate::contract::{record, RecordStore, TxContext};
    use crate::error::ErrorKind;
    use crate::ledger::Journal;

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!("ACH".parse::<TransactionType>().unwrap(), TransactionType::Ach);
        assert_eq!(
            "CreditCard".parse::<TransactionType>().unwrap(),
            TransactionType::CreditCard
        );
        assert_eq!(
            "Wire".parse::<TransactionType>(),
            Err(PaymentError::UnknownType("Wire".into()))
        );
        assert!("ach".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_unknown_type_rejected_on_decode() {
        let bytes = br#"{"id":"t1","type":"Bitcoin","amount":1.0,"account":"a","transactionDetails":""}"#;
        assert!(record::decode::<PaymentTransaction>(bytes).is_err());
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        assert_eq!(
            PaymentTransaction::new("t1", "ACH", f64::INFINITY, "acct", ""),
            Err(PaymentError::NonFiniteAmount(f64::INFINITY))
        );
        assert!(PaymentTransaction::new("t1", "ACH", f64::NAN, "acct", "").is_err());
    }

    #[test]
    fn test_transaction_wire_format() {
        let tx = PaymentTransaction::new("t1", "CreditCard", 12.5, "acct-9", "visa").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&record::encode(&tx).unwrap()).unwrap();
        assert_eq!(json["type"], "CreditCard");
        assert_eq!(json["transactionDetails"], "visa");
        assert_eq!(json["amount"], 12.5);
    }

    #[test]
    fn test_store_payments_and_shipments() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(Config::new(dir.path()).with_sync_writes(false)).unwrap();
        let ctx = TxContext::new("tx-pay", "billing");

        let payments: RecordStore<_, PaymentTransaction> = RecordStore::new(&journal, AuditLog::default());
        let tx = PaymentTransaction::new("pay_1", "ACH", 250.0, "acct-1", "invoice INV-001").unwrap();
        payments.create(&ctx, "pay_1", &tx).unwrap();
        assert_eq!(payments.read(&ctx, "pay_1").unwrap(), tx);
        assert_eq!(
            payments.create(&ctx, "pay_1", &tx).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );

        let shipments: RecordStore<_, Shipment> = RecordStore::new(&journal, AuditLog::default());
        let ship = Shipment {
            id: "ship_1".into(),
            shipment_id: "se-123".into(),
            tracking_url: "https://track.example/se-123".into(),
        };
        shipments.create(&ctx, "ship_1", &ship).unwrap();
        assert!(shipments.exists(&ctx, "ship_1").unwrap());
        assert_eq!(shipments.read(&ctx, "ship_1").unwrap(), ship);
    }
}
