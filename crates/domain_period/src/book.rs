//! The period book
//!
//! Holds a building's snapshots keyed by period and wires consecutive
//! months together: a close pulls its carry-in from the previous period's
//! close results at close time. Pulling (rather than pushing into the next
//! month) is what makes re-closing safe: a late-arriving expense can be
//! recorded and the month re-closed, and the following month simply pulls
//! the refreshed carry when it closes in turn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use core_kernel::{AccountingPeriod, BuildingId, Currency, Money};

use crate::error::PeriodError;
use crate::snapshot::{
    AccountingMode, CarryIn, CarryMode, PeriodSnapshot, SubAccount,
};

/// A building's snapshots across months
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodBook {
    building_id: BuildingId,
    currency: Currency,
    mode: AccountingMode,
    carry_mode: CarryMode,
    snapshots: BTreeMap<AccountingPeriod, PeriodSnapshot>,
}

impl PeriodBook {
    /// A book with single-stream accounting and shortfall-only carry
    pub fn new(building_id: BuildingId, currency: Currency) -> Self {
        Self {
            building_id,
            currency,
            mode: AccountingMode::default(),
            carry_mode: CarryMode::default(),
            snapshots: BTreeMap::new(),
        }
    }

    /// Switches to hybrid (operating/reserve/management) accounting
    pub fn with_mode(mut self, mode: AccountingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides how surpluses propagate
    pub fn with_carry_mode(mut self, carry_mode: CarryMode) -> Self {
        self.carry_mode = carry_mode;
        self
    }

    pub fn building_id(&self) -> BuildingId {
        self.building_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// The snapshot for a period, opened lazily
    pub fn snapshot_mut(&mut self, period: AccountingPeriod) -> &mut PeriodSnapshot {
        self.snapshots
            .entry(period)
            .or_insert_with(|| PeriodSnapshot::open(self.building_id, period, self.currency))
    }

    /// The snapshot for a period, if any activity was recorded
    pub fn snapshot(&self, period: AccountingPeriod) -> Result<&PeriodSnapshot, PeriodError> {
        self.snapshots
            .get(&period)
            .ok_or(PeriodError::SnapshotNotFound(period))
    }

    /// Snapshots in chronological order
    pub fn snapshots(&self) -> impl Iterator<Item = &PeriodSnapshot> {
        self.snapshots.values()
    }

    /// Accumulates an expense into the period
    pub fn record_expense(
        &mut self,
        period: AccountingPeriod,
        account: SubAccount,
        amount: Money,
    ) -> Result<(), PeriodError> {
        self.snapshot_mut(period).record_expense(account, amount)
    }

    /// Accumulates a received payment into the period
    pub fn record_payment(
        &mut self,
        period: AccountingPeriod,
        account: SubAccount,
        amount: Money,
    ) -> Result<(), PeriodError> {
        self.snapshot_mut(period).record_payment(account, amount)
    }

    /// Sets the period's scheduled reserve contribution
    pub fn set_reserve_contribution(&mut self, period: AccountingPeriod, amount: Money) {
        self.snapshot_mut(period).set_reserve_contribution(amount);
    }

    /// Sets the period's fixed management fee
    pub fn set_management_fee(&mut self, period: AccountingPeriod, amount: Money) {
        self.snapshot_mut(period).set_management_fee(amount);
    }

    /// Carry-ins for a period, pulled from the most recent earlier snapshot
    ///
    /// Months with no recorded activity pass the carry through unchanged,
    /// so a quiet month never launders a debt away. No earlier snapshot at
    /// all means zero carry. At a year boundary the operating carry still
    /// flows December to January; the reserve balance crosses years
    /// unchanged; unpaid management fees are settled within the year and
    /// reset to zero once the carry crosses into a new year.
    fn carry_into(&self, period: AccountingPeriod) -> Result<CarryIn, PeriodError> {
        let Some((prior_period, snapshot)) = self
            .snapshots
            .range(..period)
            .next_back()
            .map(|(p, s)| (*p, s))
        else {
            return Ok(CarryIn::zero(self.currency));
        };
        if !snapshot.is_closed() {
            return Err(PeriodError::PreviousPeriodOpen(prior_period));
        }

        let zero = Money::zero(self.currency);
        let sub_carry = |account: SubAccount| {
            snapshot.sub_ledger(account).carry_forward.unwrap_or(zero)
        };
        let mut carry = CarryIn {
            operating: sub_carry(SubAccount::Operating),
            reserve: sub_carry(SubAccount::Reserve),
            management: sub_carry(SubAccount::Management),
        };
        if period.year() > prior_period.year() {
            carry.management = zero;
        }
        Ok(carry)
    }

    /// Closes a period, pulling carry-in from the previous close
    ///
    /// Idempotent: re-closing pulls the same (or refreshed) carry-in and
    /// recomputes; it never pushes anything into the next period.
    ///
    /// # Errors
    ///
    /// `PreviousPeriodOpen` when the most recent earlier period has
    /// activity but was never closed.
    pub fn close(&mut self, period: AccountingPeriod) -> Result<&PeriodSnapshot, PeriodError> {
        let carry = self.carry_into(period)?;
        debug!(
            building = %self.building_id,
            period = %period,
            carry_in = %carry.operating,
            "closing period"
        );
        let mode = self.mode;
        let carry_mode = self.carry_mode;
        let snapshot = self.snapshot_mut(period);
        snapshot.close(mode, carry_mode, carry)?;
        Ok(&*snapshot)
    }

    /// Building-level summary of a closed period
    pub fn summary(&self, period: AccountingPeriod) -> Result<PeriodSummary, PeriodError> {
        let snapshot = self.snapshot(period)?;
        let net_result = snapshot
            .net_result
            .ok_or(PeriodError::NotClosed(period))?;
        Ok(PeriodSummary {
            period,
            total_expenses: snapshot.total_expenses()?,
            total_payments: snapshot.total_payments()?,
            carry_in: snapshot.operating.carry_in,
            net_result,
            carry_forward: snapshot.carry_forward()?,
            reserve_balance: snapshot.reserve.carry_forward,
        })
    }
}

/// Totals and carry for one closed period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: AccountingPeriod,
    pub total_expenses: Money,
    pub total_payments: Money,
    /// Operating carry pulled from the previous period
    pub carry_in: Money,
    pub net_result: Money,
    /// Operating carry into the next period
    pub carry_forward: Money,
    /// Reserve running balance after close (hybrid mode only)
    pub reserve_balance: Option<Money>,
}
