//! Immutable ledger entries
//!
//! One entry per balance-affecting event. Entries carry balance-before and
//! balance-after so the per-unit chain can be audited independently:
//! balance-after of entry N equals balance-before of entry N+1, in posting
//! order (by sequence). Value dates may run backwards within that order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ExpenseId, LedgerEntryId, Money, PaymentId, UnitId};

/// What kind of event the entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// An expense share owed by the unit (positive amount)
    Charge,
    /// A payment received from the unit (negative amount)
    Payment,
    /// An explicit correction (signed amount)
    Adjustment,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Charge => "charge",
            EntryKind::Payment => "payment",
            EntryKind::Adjustment => "adjustment",
        };
        write!(f, "{}", name)
    }
}

/// Link back to the event that produced the entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntryReference {
    Expense(ExpenseId),
    Payment(PaymentId),
    /// Operator-initiated adjustment with its stated reason
    Adjustment(String),
}

/// One immutable, signed record of a balance-affecting event
///
/// Sign convention: a positive balance is money the unit owes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier
    pub id: LedgerEntryId,
    /// The unit whose balance moved
    pub unit_id: UnitId,
    /// Business timestamp of the event
    pub posted_at: DateTime<Utc>,
    /// Signed amount applied to the balance
    pub amount: Money,
    /// Event kind
    pub kind: EntryKind,
    /// Balance immediately before this entry
    pub balance_before: Money,
    /// Balance immediately after this entry
    pub balance_after: Money,
    /// Originating expense, payment, or adjustment reason
    pub reference: EntryReference,
    /// Monotone insertion order within the ledger
    pub sequence: u64,
}
