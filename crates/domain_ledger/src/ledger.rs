//! The append-only balance ledger
//!
//! One ledger per building. The entry log is the source of truth; the
//! per-unit balance map is a cached projection updated on every append and
//! recomputable at any time via `replay`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use core_kernel::{AccountingPeriod, BuildingId, Currency, LedgerEntryId, Money, UnitId};
use domain_allocation::{Expense, ShareMap};

use crate::entry::{EntryKind, EntryReference, LedgerEntry};
use crate::error::LedgerError;
use crate::payment::Payment;
use crate::unit::Unit;

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight always exists")
        .and_utc()
}

/// Append-only transaction log and cached balances for one building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    building_id: BuildingId,
    currency: Currency,
    units: BTreeMap<UnitId, Unit>,
    /// Cached projection; ground truth is always `replay`
    balances: BTreeMap<UnitId, Money>,
    entries: Vec<LedgerEntry>,
    next_sequence: u64,
}

impl Ledger {
    /// Creates an empty ledger for a building
    pub fn new(building_id: BuildingId, currency: Currency) -> Self {
        Self {
            building_id,
            currency,
            units: BTreeMap::new(),
            balances: BTreeMap::new(),
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    pub fn building_id(&self) -> BuildingId {
        self.building_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Onboards a unit with a zero opening balance
    ///
    /// # Errors
    ///
    /// Returns `DuplicateUnit` if the unit is already registered.
    pub fn register_unit(&mut self, unit: Unit) -> Result<(), LedgerError> {
        if self.units.contains_key(&unit.id) {
            return Err(LedgerError::DuplicateUnit(unit.id));
        }
        self.balances.insert(unit.id, Money::zero(self.currency));
        self.units.insert(unit.id, unit);
        Ok(())
    }

    /// Looks up a registered unit
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Iterates registered units in identifier order
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// The cached current balance of a unit (positive = owed by the unit)
    pub fn balance(&self, unit: UnitId) -> Result<Money, LedgerError> {
        self.balances
            .get(&unit)
            .copied()
            .ok_or(LedgerError::UnknownUnit(unit))
    }

    /// Appends one entry, performing the balance read-modify-write
    ///
    /// # Errors
    ///
    /// `UnknownUnit` for unregistered units; currency mismatches surface as
    /// `Money` errors before anything mutates.
    pub fn append(
        &mut self,
        unit: UnitId,
        amount: Money,
        kind: EntryKind,
        reference: EntryReference,
        posted_at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        let balance_before = self.balance(unit)?;
        let balance_after = balance_before.checked_add(&amount)?;

        let entry = LedgerEntry {
            id: LedgerEntryId::new_v7(),
            unit_id: unit,
            posted_at,
            amount,
            kind,
            balance_before,
            balance_after,
            reference,
            sequence: self.next_sequence,
        };

        self.next_sequence += 1;
        self.balances.insert(unit, balance_after);
        self.entries.push(entry.clone());

        debug!(unit = %unit, kind = %kind, amount = %amount, balance = %balance_after, "ledger entry appended");
        Ok(entry)
    }

    /// Atomic fan-out of one expense into one charge entry per unit
    ///
    /// All validation (share sum, currency, unit registration) and entry
    /// staging happen before any state mutates; a failure leaves the ledger
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// - `EmptyFanOut` for an empty share map
    /// - `ShareSumMismatch` when shares do not conserve the expense amount
    /// - `UnknownUnit` when a share names an unregistered unit
    pub fn charge_expense(
        &mut self,
        expense: &Expense,
        shares: &ShareMap,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        if shares.is_empty() {
            return Err(LedgerError::EmptyFanOut);
        }
        let total = shares.total();
        if total != expense.amount {
            return Err(LedgerError::ShareSumMismatch {
                expected: expense.amount.amount(),
                actual: total.amount(),
            });
        }

        let posted_at = midnight(expense.effective_date);
        let mut staged = Vec::with_capacity(shares.len());
        let mut sequence = self.next_sequence;

        for (unit, share) in shares.iter() {
            let balance_before = self.balance(unit)?;
            let balance_after = balance_before.checked_add(&share)?;
            staged.push(LedgerEntry {
                id: LedgerEntryId::new_v7(),
                unit_id: unit,
                posted_at,
                amount: share,
                kind: EntryKind::Charge,
                balance_before,
                balance_after,
                reference: EntryReference::Expense(expense.id),
                sequence,
            });
            sequence += 1;
        }

        // Commit point: nothing above mutated the ledger
        for entry in &staged {
            self.balances.insert(entry.unit_id, entry.balance_after);
        }
        self.next_sequence = sequence;
        self.entries.extend(staged.iter().cloned());

        info!(
            expense = %expense.id,
            category = %expense.category,
            total = %expense.amount,
            units = staged.len(),
            "expense fanned out"
        );
        Ok(staged)
    }

    /// Records a payment as exactly one negative entry
    ///
    /// # Errors
    ///
    /// `NonPositivePayment` unless the amount is strictly positive.
    pub fn post_payment(&mut self, payment: &Payment) -> Result<LedgerEntry, LedgerError> {
        if !payment.amount.is_positive() {
            return Err(LedgerError::NonPositivePayment(payment.amount.amount()));
        }
        self.append(
            payment.unit_id,
            -payment.amount,
            EntryKind::Payment,
            EntryReference::Payment(payment.id),
            midnight(payment.paid_on),
        )
    }

    /// Records an explicit correction entry
    pub fn post_adjustment(
        &mut self,
        unit: UnitId,
        amount: Money,
        reason: impl Into<String>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.append(
            unit,
            amount,
            EntryKind::Adjustment,
            EntryReference::Adjustment(reason.into()),
            Utc::now(),
        )
    }

    /// Recomputes a unit's balance from entries alone, up to `as_of`
    ///
    /// This is the ground truth the integrity validator audits the cached
    /// balance against.
    pub fn replay(&self, unit: UnitId, as_of: DateTime<Utc>) -> Result<Money, LedgerError> {
        if !self.units.contains_key(&unit) {
            return Err(LedgerError::UnknownUnit(unit));
        }
        let mut balance = Money::zero(self.currency);
        for entry in self.entries_for(unit) {
            if entry.posted_at <= as_of {
                balance = balance.checked_add(&entry.amount)?;
            }
        }
        Ok(balance)
    }

    /// A unit's entries ordered by timestamp then sequence, for statements
    /// and display
    pub fn entries_for(&self, unit: UnitId) -> Vec<&LedgerEntry> {
        let mut entries: Vec<&LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.unit_id == unit)
            .collect();
        entries.sort_by_key(|e| (e.posted_at, e.sequence));
        entries
    }

    /// A unit's entries in posting order
    ///
    /// Balances are computed at append time, so the balance-before and
    /// balance-after chain only holds in this order. Value dates may run
    /// backwards within it (a payment value-dated before an earlier charge).
    pub fn journal_for(&self, unit: UnitId) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.unit_id == unit)
            .collect()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Per-unit activity breakdown for one month
    pub fn monthly_statement(
        &self,
        unit: UnitId,
        period: AccountingPeriod,
    ) -> Result<UnitMonthlyStatement, LedgerError> {
        let period_start = midnight(period.first_day());
        let opening_balance = {
            // Entries strictly before the period
            let mut balance = Money::zero(self.currency);
            for entry in self.entries_for(unit) {
                if entry.posted_at < period_start {
                    balance = balance.checked_add(&entry.amount)?;
                }
            }
            // Fails early for unknown units
            self.balance(unit)?;
            balance
        };

        let mut charges = Money::zero(self.currency);
        let mut payments = Money::zero(self.currency);
        let mut adjustments = Money::zero(self.currency);
        let mut entries = Vec::new();

        for entry in self.entries_for(unit) {
            if !period.contains(entry.posted_at.date_naive()) {
                continue;
            }
            match entry.kind {
                EntryKind::Charge => charges = charges.checked_add(&entry.amount)?,
                EntryKind::Payment => {
                    payments = payments.checked_add(&entry.amount.abs())?
                }
                EntryKind::Adjustment => {
                    adjustments = adjustments.checked_add(&entry.amount)?
                }
            }
            entries.push(entry.clone());
        }

        let closing_balance = opening_balance
            .checked_add(&charges)?
            .checked_sub(&payments)?
            .checked_add(&adjustments)?;

        Ok(UnitMonthlyStatement {
            unit_id: unit,
            period,
            opening_balance,
            charges,
            payments,
            adjustments,
            closing_balance,
            entries,
        })
    }

    /// Overwrites the cached balance; reserved for explicit repair
    pub(crate) fn overwrite_cached_balance(&mut self, unit: UnitId, balance: Money) {
        self.balances.insert(unit, balance);
    }
}

/// One unit's activity in one month, for display or export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitMonthlyStatement {
    pub unit_id: UnitId,
    pub period: AccountingPeriod,
    pub opening_balance: Money,
    /// Sum of charge entries in the month
    pub charges: Money,
    /// Sum of payments in the month (as a positive magnitude)
    pub payments: Money,
    /// Signed sum of adjustment entries in the month
    pub adjustments: Money,
    pub closing_balance: Money,
    pub entries: Vec<LedgerEntry>,
}
