//! Allocation Domain - Expense Distribution
//!
//! This crate decides how much each apartment owes for a shared expense.
//! It covers ownership weights (mills), metered-consumption ingestion, the
//! fixed/variable heating split, and the distribution policies themselves.
//!
//! # Conservation invariant
//!
//! For every expense and every policy, the per-unit shares sum to the expense
//! amount *exactly*. Shares are computed at full precision, rounded to the
//! currency's minor unit, and the rounding residual is assigned entirely to
//! the unit with the largest weight (ties broken by lowest unit identifier).
//! No cent is ever silently dropped.
//!
//! # Policies
//!
//! - **EqualShare**: amount / unit count
//! - **Weighted**: amount x unit mills / total mills for a weight kind
//! - **Metered**: heating kinds split into a fixed portion (by heating
//!   weights) and a variable portion (by measured consumption); other meter
//!   kinds distribute proportionally to consumption

pub mod error;
pub mod weights;
pub mod metering;
pub mod consumption;
pub mod distribution;
pub mod expense;

pub use error::{AllocationError, ConfigurationError, DataIntegrityError, PolicyError};
pub use weights::{UnitWeights, WeightKind, WeightTable, MILLS_SCALE};
pub use metering::{ConsumptionStatement, MeterKind, MeterLog, MeterReading};
pub use consumption::{ConsumptionAllocator, HeatingSplit};
pub use distribution::{DistributionEngine, DistributionPolicy, ShareMap};
pub use expense::{Expense, ExpenseCategory};
