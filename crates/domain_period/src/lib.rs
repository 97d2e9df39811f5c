//! Period Domain - Monthly Snapshots and Carry-Forward
//!
//! A building's activity is cut into monthly snapshots. While open, a
//! snapshot accumulates expenses and payments; closing it computes the net
//! result and the carry-forward that the next month pulls in as its opening
//! obligation. In hybrid mode, operating costs, reserve-fund savings, and
//! management fees live in three independent sub-ledgers whose results are
//! never netted against each other.
//!
//! # Carry policy
//!
//! By default only a shortfall carries forward (a surplus means no carry).
//! `CarryMode::Signed` is the explicit opt-in for signed running balances
//! where surpluses offset future obligations.

pub mod error;
pub mod snapshot;
pub mod book;

pub use error::PeriodError;
pub use snapshot::{
    AccountingMode, CarryIn, CarryMode, PeriodSnapshot, SnapshotStatus, SubAccount, SubLedger,
};
pub use book::{PeriodBook, PeriodSummary};
