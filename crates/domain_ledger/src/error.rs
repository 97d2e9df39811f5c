//! Ledger domain errors

use core_kernel::{LedgerEntryId, MoneyError, UnitId};
use domain_allocation::AllocationError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Divergence between the ledger and its cached projections
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerConsistencyError {
    /// Cached balance differs from the replayed balance beyond epsilon
    #[error(
        "Stored balance {stored} diverges from replayed balance {replayed} for unit {unit}"
    )]
    BalanceDivergence {
        unit: UnitId,
        stored: Decimal,
        replayed: Decimal,
    },

    /// balance-after of one entry does not match balance-before of the next
    #[error("Balance chain broken at entry {entry} for unit {unit}")]
    BrokenChain { unit: UnitId, entry: LedgerEntryId },
}

/// Errors raised by ledger operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Operation on a unit the ledger does not know
    #[error("Unit not registered in the ledger: {0}")]
    UnknownUnit(UnitId),

    /// Registration of an already-known unit
    #[error("Unit already registered: {0}")]
    DuplicateUnit(UnitId),

    /// Fan-out whose shares do not sum to the expense amount
    #[error("Shares sum to {actual}, expected expense total {expected}")]
    ShareSumMismatch { expected: Decimal, actual: Decimal },

    /// Fan-out with no shares at all
    #[error("Expense fan-out requires at least one share")]
    EmptyFanOut,

    /// Payment amounts must be positive
    #[error("Payment amount must be positive, got {0}")]
    NonPositivePayment(Decimal),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Ledger consistency error: {0}")]
    Consistency(#[from] LedgerConsistencyError),
}
