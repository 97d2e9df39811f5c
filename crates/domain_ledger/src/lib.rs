//! Ledger Domain - Balance Ledger and Integrity Auditing
//!
//! The append-only ledger is the sole authority for a unit's balance. Every
//! balance-affecting event (expense share, payment, adjustment) becomes one
//! immutable entry carrying balance-before and balance-after; the cached
//! per-unit balance is a projection that can always be recomputed by
//! replaying entries.
//!
//! # Atomicity
//!
//! One expense's fan-out (N shares, N entries, N balance updates) commits
//! all-or-nothing: shares are validated and entries staged before any state
//! mutates, so a failed registration leaves the ledger untouched.
//!
//! # Corrections
//!
//! Entries are never mutated or deleted. Corrections are new entries of kind
//! `Adjustment`, and the only write path outside `append` is the explicitly
//! operator-invoked `IntegrityValidator::repair`.

pub mod error;
pub mod unit;
pub mod entry;
pub mod payment;
pub mod ledger;
pub mod integrity;
pub mod services;

pub use error::{LedgerConsistencyError, LedgerError};
pub use unit::Unit;
pub use entry::{EntryKind, EntryReference, LedgerEntry};
pub use payment::{Payment, PaymentMethod};
pub use ledger::{Ledger, UnitMonthlyStatement};
pub use integrity::{DuplicateCandidate, IntegrityReport, IntegrityValidator};
pub use services::ExpensePostingService;
