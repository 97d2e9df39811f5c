//! Monthly period snapshots
//!
//! A snapshot accumulates one month's activity for a building and, on close,
//! computes the net result and the carry-forward into the next period.
//! Closing derives results from the accumulated inputs without mutating
//! them, so re-closing an already-closed period recomputes the same values
//! instead of double-counting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use core_kernel::{AccountingPeriod, BuildingId, Currency, Money, SnapshotId};

use crate::error::PeriodError;

/// Whether the snapshot is still accumulating or finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Open,
    Closed,
}

/// How a net surplus propagates into the next period
///
/// `ShortfallOnly` is the conservative default: only debt carries forward,
/// a surplus simply means no carry. `Signed` also propagates surpluses as
/// negative carry, offsetting future obligations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryMode {
    #[default]
    ShortfallOnly,
    Signed,
}

impl CarryMode {
    fn carry_from_net(&self, net: Money) -> Money {
        match self {
            CarryMode::ShortfallOnly => (-net).clamp_non_negative(),
            CarryMode::Signed => -net,
        }
    }
}

/// Whether snapshots track one pooled ledger or three separated ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingMode {
    /// Single pooled result per month
    #[default]
    Single,
    /// Operating, reserve, and management tracked independently, so reserve
    /// savings and management fees are never netted against operating debt
    Hybrid,
}

/// The three separated money streams of hybrid accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubAccount {
    Operating,
    Reserve,
    Management,
}

impl fmt::Display for SubAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubAccount::Operating => "operating",
            SubAccount::Reserve => "reserve",
            SubAccount::Management => "management",
        };
        write!(f, "{}", name)
    }
}

/// Accumulated totals and close results for one sub-account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLedger {
    /// Sum of expenses recorded in the period
    pub expenses: Money,
    /// Sum of payments received in the period
    pub payments: Money,
    /// Carry pulled from the previous period at close time
    pub carry_in: Money,
    /// Net result, set on close
    pub net_result: Option<Money>,
    /// Carry into the next period, set on close
    pub carry_forward: Option<Money>,
}

impl SubLedger {
    fn new(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            expenses: zero,
            payments: zero,
            carry_in: zero,
            net_result: None,
            carry_forward: None,
        }
    }

    fn add_expense(&mut self, amount: Money) -> Result<(), PeriodError> {
        self.expenses = self.expenses.checked_add(&amount)?;
        Ok(())
    }

    fn add_payment(&mut self, amount: Money) -> Result<(), PeriodError> {
        self.payments = self.payments.checked_add(&amount)?;
        Ok(())
    }
}

/// Carry-in amounts pulled from the previous period's close results
#[derive(Debug, Clone, Copy)]
pub struct CarryIn {
    pub operating: Money,
    pub reserve: Money,
    pub management: Money,
}

impl CarryIn {
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            operating: zero,
            reserve: zero,
            management: zero,
        }
    }
}

/// One month's accumulated activity and close results for a building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    /// Unique identifier
    pub id: SnapshotId,
    /// Building the snapshot belongs to
    pub building_id: BuildingId,
    /// The (year, month) the snapshot covers
    pub period: AccountingPeriod,
    /// Snapshot currency
    pub currency: Currency,
    /// Open or closed
    pub status: SnapshotStatus,
    /// Operating stream (day-to-day expenses and dues)
    pub operating: SubLedger,
    /// Reserve stream (long-term savings, signed running balance)
    pub reserve: SubLedger,
    /// Management stream (the administrator's fee)
    pub management: SubLedger,
    /// Scheduled reserve-fund contribution for the period
    pub reserve_contribution: Money,
    /// Fixed management fee for the period
    pub management_fee: Money,
    /// Overall net result, set on close
    pub net_result: Option<Money>,
    /// First close timestamp; re-closing keeps the original
    pub closed_at: Option<DateTime<Utc>>,
}

impl PeriodSnapshot {
    /// Opens an empty snapshot
    pub fn open(building_id: BuildingId, period: AccountingPeriod, currency: Currency) -> Self {
        Self {
            id: SnapshotId::new_v7(),
            building_id,
            period,
            currency,
            status: SnapshotStatus::Open,
            operating: SubLedger::new(currency),
            reserve: SubLedger::new(currency),
            management: SubLedger::new(currency),
            reserve_contribution: Money::zero(currency),
            management_fee: Money::zero(currency),
            net_result: None,
            closed_at: None,
        }
    }

    fn sub_ledger_mut(&mut self, account: SubAccount) -> &mut SubLedger {
        match account {
            SubAccount::Operating => &mut self.operating,
            SubAccount::Reserve => &mut self.reserve,
            SubAccount::Management => &mut self.management,
        }
    }

    /// The sub-ledger of an account
    pub fn sub_ledger(&self, account: SubAccount) -> &SubLedger {
        match account {
            SubAccount::Operating => &self.operating,
            SubAccount::Reserve => &self.reserve,
            SubAccount::Management => &self.management,
        }
    }

    /// Accumulates an expense into a sub-account
    pub fn record_expense(
        &mut self,
        account: SubAccount,
        amount: Money,
    ) -> Result<(), PeriodError> {
        self.sub_ledger_mut(account).add_expense(amount)
    }

    /// Accumulates a received payment into a sub-account
    pub fn record_payment(
        &mut self,
        account: SubAccount,
        amount: Money,
    ) -> Result<(), PeriodError> {
        self.sub_ledger_mut(account).add_payment(amount)
    }

    /// Sets the period's scheduled reserve contribution
    pub fn set_reserve_contribution(&mut self, amount: Money) {
        self.reserve_contribution = amount;
    }

    /// Sets the period's fixed management fee
    pub fn set_management_fee(&mut self, amount: Money) {
        self.management_fee = amount;
    }

    /// Expenses across all sub-accounts
    pub fn total_expenses(&self) -> Result<Money, PeriodError> {
        Ok(self
            .operating
            .expenses
            .checked_add(&self.reserve.expenses)?
            .checked_add(&self.management.expenses)?)
    }

    /// Payments across all sub-accounts
    pub fn total_payments(&self) -> Result<Money, PeriodError> {
        Ok(self
            .operating
            .payments
            .checked_add(&self.reserve.payments)?
            .checked_add(&self.management.payments)?)
    }

    /// Finalizes the snapshot, computing net result and carry-forward
    ///
    /// Idempotent: results are pure functions of the accumulated inputs and
    /// the given carry-ins, so a re-close recomputes instead of compounding.
    pub fn close(
        &mut self,
        mode: AccountingMode,
        carry_mode: CarryMode,
        carry: CarryIn,
    ) -> Result<(), PeriodError> {
        self.operating.carry_in = carry.operating;
        self.reserve.carry_in = carry.reserve;
        self.management.carry_in = carry.management;

        match mode {
            AccountingMode::Single => self.close_single(carry_mode)?,
            AccountingMode::Hybrid => self.close_hybrid(carry_mode)?,
        }

        if self.closed_at.is_none() {
            self.closed_at = Some(Utc::now());
        }
        self.status = SnapshotStatus::Closed;
        info!(
            building = %self.building_id,
            period = %self.period,
            net = %self.net_result.unwrap_or_else(|| Money::zero(self.currency)),
            "period closed"
        );
        Ok(())
    }

    /// netResult = payments - (expenses + reserve + fee + carryIn), all on
    /// the pooled operating stream
    fn close_single(&mut self, carry_mode: CarryMode) -> Result<(), PeriodError> {
        let outflow = self
            .total_expenses()?
            .checked_add(&self.reserve_contribution)?
            .checked_add(&self.management_fee)?
            .checked_add(&self.operating.carry_in)?;
        let net = self.total_payments()?.checked_sub(&outflow)?;

        self.net_result = Some(net);
        self.operating.net_result = Some(net);
        self.operating.carry_forward = Some(carry_mode.carry_from_net(net));
        self.reserve.net_result = None;
        self.reserve.carry_forward = None;
        self.management.net_result = None;
        self.management.carry_forward = None;
        Ok(())
    }

    /// Each stream closes independently; reserve savings and management fees
    /// never offset operating debt
    fn close_hybrid(&mut self, carry_mode: CarryMode) -> Result<(), PeriodError> {
        // Operating: monthly carry under the configured mode
        let op_outflow = self
            .operating
            .expenses
            .checked_add(&self.operating.carry_in)?;
        let op_net = self.operating.payments.checked_sub(&op_outflow)?;
        self.operating.net_result = Some(op_net);
        self.operating.carry_forward = Some(carry_mode.carry_from_net(op_net));

        // Reserve: signed running balance, surpluses always kept
        let res_balance = self
            .reserve
            .carry_in
            .checked_add(&self.reserve_contribution)?
            .checked_add(&self.reserve.payments)?
            .checked_sub(&self.reserve.expenses)?;
        self.reserve.net_result = Some(res_balance.checked_sub(&self.reserve.carry_in)?);
        self.reserve.carry_forward = Some(res_balance);

        // Management: only unpaid fees roll forward
        let mgmt_outflow = self
            .management_fee
            .checked_add(&self.management.expenses)?
            .checked_add(&self.management.carry_in)?;
        let mgmt_net = self.management.payments.checked_sub(&mgmt_outflow)?;
        self.management.net_result = Some(mgmt_net);
        self.management.carry_forward = Some((-mgmt_net).clamp_non_negative());

        self.net_result = Some(op_net);
        Ok(())
    }

    /// The operating carry into the next period
    ///
    /// # Errors
    ///
    /// `NotClosed` while the snapshot is still open.
    pub fn carry_forward(&self) -> Result<Money, PeriodError> {
        self.operating
            .carry_forward
            .ok_or(PeriodError::NotClosed(self.period))
    }

    pub fn is_closed(&self) -> bool {
        self.status == SnapshotStatus::Closed
    }
}
