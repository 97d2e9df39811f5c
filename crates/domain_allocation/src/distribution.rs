//! Distribution policies and the exact-rounding share computation
//!
//! Every policy guarantees `sum(shares) == expense.amount` exactly. Shares
//! are computed at full precision, rounded to the currency minor unit, and
//! the residual cent (true total minus rounded sum) is assigned to the unit
//! with the largest weight; ties go to the lowest unit identifier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use core_kernel::{Currency, Money, MoneyError, UnitId};

use crate::consumption::ConsumptionAllocator;
use crate::error::{AllocationError, ConfigurationError, PolicyError};
use crate::expense::Expense;
use crate::metering::{ConsumptionStatement, MeterKind};
use crate::weights::{WeightKind, WeightTable};

/// How an expense is apportioned across units
///
/// A closed enumeration: policy dispatch is resolved at compile time, there
/// is no dynamic policy registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "kind", rename_all = "snake_case")]
pub enum DistributionPolicy {
    /// amount / unit count
    EqualShare,
    /// amount x unit mills / total mills for the weight kind
    Weighted(WeightKind),
    /// consumption-proportional; heating kinds get the fixed/variable split
    Metered(MeterKind),
}

impl fmt::Display for DistributionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionPolicy::EqualShare => write!(f, "equal-share"),
            DistributionPolicy::Weighted(kind) => write!(f, "weighted({})", kind),
            DistributionPolicy::Metered(kind) => write!(f, "metered({})", kind),
        }
    }
}

/// Per-unit monetary shares of one expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMap {
    currency: Currency,
    shares: BTreeMap<UnitId, Money>,
}

impl ShareMap {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            shares: BTreeMap::new(),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Sets a unit's share
    pub fn insert(&mut self, unit: UnitId, share: Money) -> Result<(), MoneyError> {
        if share.currency() != self.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                share.currency().to_string(),
            ));
        }
        self.shares.insert(unit, share);
        Ok(())
    }

    /// Adds a delta onto a unit's share (starting from zero)
    pub fn add_to(&mut self, unit: UnitId, delta: Money) -> Result<(), MoneyError> {
        let current = self.get(unit);
        let updated = current.checked_add(&delta)?;
        self.shares.insert(unit, updated);
        Ok(())
    }

    /// A unit's share (zero when absent)
    pub fn get(&self, unit: UnitId) -> Money {
        self.shares
            .get(&unit)
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency))
    }

    /// The exact sum of all shares
    pub fn total(&self) -> Money {
        self.shares
            .values()
            .fold(Money::zero(self.currency), |acc, s| acc + *s)
    }

    /// Iterates (unit, share) pairs in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, Money)> + '_ {
        self.shares.iter().map(|(u, m)| (*u, *m))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// Distributes `total` proportionally to `weights`, conserving the sum
///
/// The workhorse behind every policy. Weights may be mills or measured
/// consumption; only their ratios matter. Pairs must be in unit-identifier
/// order for the deterministic tie-break.
pub fn exact_shares(
    total: Money,
    weights: &[(UnitId, Decimal)],
) -> Result<ShareMap, AllocationError> {
    if weights.is_empty() {
        return Err(ConfigurationError::NoUnits.into());
    }
    let weight_sum: Decimal = weights.iter().map(|(_, w)| *w).sum();
    if weight_sum.is_zero() {
        return Err(ConfigurationError::ZeroWeightSum.into());
    }

    let currency = total.currency();
    let mut shares = ShareMap::new(currency);
    let mut rounded_sum = Money::zero(currency);

    for (unit, weight) in weights {
        let exact = total.amount() * *weight / weight_sum;
        let share = Money::new(exact, currency).round_to_currency();
        shares.insert(*unit, share)?;
        rounded_sum = rounded_sum.checked_add(&share)?;
    }

    let residual = total.checked_sub(&rounded_sum)?;
    if !residual.is_zero() {
        // First strictly-largest weight wins; input order is unit-id order
        let mut target = weights[0].0;
        let mut largest = weights[0].1;
        for (unit, weight) in &weights[1..] {
            if *weight > largest {
                target = *unit;
                largest = *weight;
            }
        }
        shares.add_to(target, residual)?;
    }

    Ok(shares)
}

/// Applies one distribution policy to one expense
pub struct DistributionEngine<'a> {
    weights: &'a WeightTable,
    heating: ConsumptionAllocator,
}

impl<'a> DistributionEngine<'a> {
    /// Creates an engine over a building's weight table
    pub fn new(weights: &'a WeightTable) -> Self {
        Self {
            weights,
            heating: ConsumptionAllocator::default(),
        }
    }

    /// Replaces the heating allocator (e.g. a different fixed portion)
    pub fn with_heating_allocator(mut self, heating: ConsumptionAllocator) -> Self {
        self.heating = heating;
        self
    }

    /// Computes per-unit shares for an expense
    ///
    /// Metered policies need the consumption statement for the covered
    /// period; the other policies ignore it.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` when the required weight kind is absent or zero
    /// - `PolicyError` when a metered policy lacks a matching statement
    pub fn allocate(
        &self,
        expense: &Expense,
        statement: Option<&ConsumptionStatement>,
    ) -> Result<ShareMap, AllocationError> {
        let shares = match expense.policy {
            DistributionPolicy::EqualShare => self.equal_shares(expense.amount)?,
            DistributionPolicy::Weighted(kind) => self.weighted_shares(expense.amount, kind)?,
            DistributionPolicy::Metered(kind) => {
                let statement = statement.ok_or(PolicyError::MissingConsumptionStatement {
                    kind,
                })?;
                if statement.kind() != kind {
                    return Err(PolicyError::StatementKindMismatch {
                        expected: kind,
                        found: statement.kind(),
                    }
                    .into());
                }
                if kind.is_heating() {
                    self.heating
                        .allocate(expense.amount, self.weights, statement)?
                        .combined()?
                } else {
                    self.metered_shares(expense.amount, statement)?
                }
            }
        };

        debug_assert_eq!(shares.total(), expense.amount);
        debug!(
            expense = %expense.id,
            policy = %expense.policy,
            total = %expense.amount,
            units = shares.len(),
            "allocated expense"
        );
        Ok(shares)
    }

    fn equal_shares(&self, total: Money) -> Result<ShareMap, AllocationError> {
        let pairs: Vec<(UnitId, Decimal)> = self
            .weights
            .units()
            .map(|u| (u, Decimal::ONE))
            .collect();
        exact_shares(total, &pairs)
    }

    fn weighted_shares(&self, total: Money, kind: WeightKind) -> Result<ShareMap, AllocationError> {
        self.weights.require_weights(kind)?;
        let pairs: Vec<(UnitId, Decimal)> = self
            .weights
            .weights_for(kind)
            .map(|(u, mills)| (u, Decimal::from(mills)))
            .collect();
        exact_shares(total, &pairs)
    }

    /// Non-heating metered distribution: purely consumption-proportional,
    /// falling back to equal shares when nothing was consumed
    fn metered_shares(
        &self,
        total: Money,
        statement: &ConsumptionStatement,
    ) -> Result<ShareMap, AllocationError> {
        if statement.total_usage().is_zero() {
            return self.equal_shares(total);
        }
        let pairs: Vec<(UnitId, Decimal)> = self
            .weights
            .units()
            .map(|u| (u, statement.usage_of(u)))
            .collect();
        exact_shares(total, &pairs)
    }
}
