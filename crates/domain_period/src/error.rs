//! Period domain errors

use core_kernel::{AccountingPeriod, MoneyError};
use thiserror::Error;

/// Errors raised by snapshot and period-book operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    /// No snapshot exists for the period
    #[error("No snapshot recorded for period {0}")]
    SnapshotNotFound(AccountingPeriod),

    /// Closing a period whose predecessor is still open
    #[error("Cannot close: previous period {0} is still open")]
    PreviousPeriodOpen(AccountingPeriod),

    /// Reading closed-only results from an open snapshot
    #[error("Period {0} has not been closed")]
    NotClosed(AccountingPeriod),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
