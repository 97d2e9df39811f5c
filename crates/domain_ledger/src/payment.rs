//! Unit payments
//!
//! A payment produces exactly one ledger entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PaymentId, UnitId};

/// How the payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    DirectDebit,
    StandingOrder,
    Card,
    Check,
    Cash,
}

/// A payment received from a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Paying unit
    pub unit_id: UnitId,
    /// Amount received (positive)
    pub amount: Money,
    /// Value date of the payment
    pub paid_on: NaiveDate,
    /// Payment method
    pub method: PaymentMethod,
    /// External reference (bank statement line, transaction id)
    pub external_reference: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a new payment
    pub fn new(unit_id: UnitId, amount: Money, paid_on: NaiveDate, method: PaymentMethod) -> Self {
        Self {
            id: PaymentId::new_v7(),
            unit_id,
            amount,
            paid_on,
            method,
            external_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches an external reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }
}
