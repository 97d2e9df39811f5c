//! Core Kernel - Foundational types for the condominium accounting engine
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Accounting periods for discrete monthly batch processing
//! - Strongly-typed identifiers

pub mod money;
pub mod period;
pub mod identifiers;

pub use money::{Money, Currency, MoneyError, Rate};
pub use period::{AccountingPeriod, DateRange, TemporalError};
pub use identifiers::{
    BuildingId, UnitId, ExpenseId, PaymentId, LedgerEntryId,
    MeterReadingId, SnapshotId,
};
