//! Allocation domain errors
//!
//! Configuration and policy errors are raised synchronously at
//! expense-registration time and block the ledger fan-out. Data-integrity
//! errors are raised at meter-reading ingestion or statement construction.

use core_kernel::{MoneyError, UnitId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::metering::MeterKind;
use crate::weights::WeightKind;

/// Missing or unusable weight configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A policy needs a weight kind whose total is zero
    #[error("Total {kind} weight is zero but an active policy requires it")]
    ZeroTotalWeight { kind: WeightKind },

    /// The weight table has no units at all
    #[error("No units registered in the weight table")]
    NoUnits,

    /// A unit weight exceeds the mills scale
    #[error("Weight {mills} for unit {unit} exceeds the 0-1000 mills scale")]
    WeightOutOfRange { unit: UnitId, mills: u32 },

    /// Weight update for a unit the table does not know
    #[error("Unit {0} is not registered in the weight table")]
    UnknownUnit(UnitId),

    /// Fixed heating portion outside the representable range
    #[error("Fixed heating portion {0} must lie within [0, 1]")]
    FixedPortionOutOfRange(Decimal),

    /// Distribution keys (weights or usage) summing to zero
    #[error("Distribution weights sum to zero")]
    ZeroWeightSum,
}

/// A distribution policy that cannot run as requested
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// Metered policy invoked without a consumption statement
    #[error("Metered policy for {kind} requires a consumption statement")]
    MissingConsumptionStatement { kind: MeterKind },

    /// Statement covers a different meter kind than the policy
    #[error("Consumption statement covers {found}, but the policy meters {expected}")]
    StatementKindMismatch {
        expected: MeterKind,
        found: MeterKind,
    },
}

/// Malformed or impossible metering data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataIntegrityError {
    /// Cumulative meter value went down
    #[error(
        "Decreasing reading for unit {unit} meter {kind}: previous {previous}, new {value}"
    )]
    NonMonotonicReading {
        unit: UnitId,
        kind: MeterKind,
        previous: Decimal,
        value: Decimal,
    },

    /// Reading timestamped before an already-recorded reading
    #[error("Out-of-order reading for unit {unit} meter {kind}")]
    OutOfOrderReading { unit: UnitId, kind: MeterKind },

    /// Cumulative meter value below zero
    #[error("Negative reading {value} for unit {unit} meter {kind}")]
    NegativeReading {
        unit: UnitId,
        kind: MeterKind,
        value: Decimal,
    },

    /// Consumption delta below zero
    #[error("Negative consumption delta {delta} for unit {unit}")]
    NegativeConsumption { unit: UnitId, delta: Decimal },
}

/// Umbrella error for the allocation domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
