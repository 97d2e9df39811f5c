//! Fixed/variable heating split
//!
//! A heating expense covers standing losses (circulation, boiler idling)
//! regardless of use, so a configurable fixed portion is distributed by
//! heating weights while the rest follows measured consumption. The two
//! portions always conserve the expense total exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use core_kernel::{Money, MoneyError, Rate, UnitId};

use crate::distribution::{exact_shares, ShareMap};
use crate::error::{AllocationError, ConfigurationError};
use crate::metering::ConsumptionStatement;
use crate::weights::{WeightKind, WeightTable};

/// Splits heating expenses into fixed and variable portions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionAllocator {
    fixed_portion: Rate,
}

impl ConsumptionAllocator {
    /// Creates an allocator with the given fixed portion
    ///
    /// The portion must lie within [0, 1]. Values outside the customary
    /// 20-30% band are accepted but logged.
    pub fn new(fixed_portion: Rate) -> Result<Self, ConfigurationError> {
        if !fixed_portion.is_within(Decimal::ZERO, Decimal::ONE) {
            return Err(ConfigurationError::FixedPortionOutOfRange(
                fixed_portion.as_decimal(),
            ));
        }
        if !fixed_portion.is_within(dec!(0.20), dec!(0.30)) {
            warn!(portion = %fixed_portion, "fixed heating portion outside the customary 20-30% band");
        }
        Ok(Self { fixed_portion })
    }

    /// Returns the configured fixed portion
    pub fn fixed_portion(&self) -> Rate {
        self.fixed_portion
    }

    /// Splits a total into (fixed, variable), conserving the sum
    ///
    /// The fixed portion is rounded to the minor unit; the variable portion
    /// is the exact remainder.
    pub fn split(&self, total: Money) -> Result<(Money, Money), MoneyError> {
        let fixed = self.fixed_portion.apply(&total).round_to_currency();
        let variable = total.checked_sub(&fixed)?;
        Ok((fixed, variable))
    }

    /// Allocates a heating expense across units
    ///
    /// Fixed portion by heating weights; variable portion proportional to
    /// measured consumption. A unit that consumed nothing owes no variable
    /// share but still owes its fixed share. If nothing at all was consumed,
    /// the variable portion falls back to heating weights.
    pub fn allocate(
        &self,
        total: Money,
        weights: &WeightTable,
        statement: &ConsumptionStatement,
    ) -> Result<HeatingSplit, AllocationError> {
        weights.require_weights(WeightKind::Heating)?;

        let (fixed_total, variable_total) = self.split(total)?;

        let heating_pairs: Vec<(UnitId, Decimal)> = weights
            .weights_for(WeightKind::Heating)
            .map(|(u, mills)| (u, Decimal::from(mills)))
            .collect();

        let fixed = exact_shares(fixed_total, &heating_pairs)?;

        let variable = if statement.total_usage().is_zero() {
            exact_shares(variable_total, &heating_pairs)?
        } else {
            let usage_pairs: Vec<(UnitId, Decimal)> = weights
                .units()
                .map(|u| (u, statement.usage_of(u)))
                .collect();
            exact_shares(variable_total, &usage_pairs)?
        };

        Ok(HeatingSplit { fixed, variable })
    }
}

impl Default for ConsumptionAllocator {
    /// The customary default: 25% fixed
    fn default() -> Self {
        Self {
            fixed_portion: Rate::new(dec!(0.25)),
        }
    }
}

/// The two halves of an allocated heating expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatingSplit {
    pub fixed: ShareMap,
    pub variable: ShareMap,
}

impl HeatingSplit {
    /// Sum of the fixed shares
    pub fn fixed_total(&self) -> Money {
        self.fixed.total()
    }

    /// Sum of the variable shares
    pub fn variable_total(&self) -> Money {
        self.variable.total()
    }

    /// Merges both portions into one per-unit share map
    pub fn combined(&self) -> Result<ShareMap, MoneyError> {
        let mut combined = self.fixed.clone();
        for (unit, share) in self.variable.iter() {
            combined.add_to(unit, share)?;
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{BuildingId, Currency, DateRange};
    use rust_decimal_macros::dec;

    use crate::metering::MeterKind;
    use crate::weights::UnitWeights;

    fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::Eur)
    }

    fn three_unit_table() -> (WeightTable, Vec<UnitId>) {
        let mut table = WeightTable::new(BuildingId::new());
        let mut units: Vec<UnitId> = (0..3).map(|_| UnitId::new()).collect();
        units.sort();
        for (unit, mills) in units.iter().zip([333u32, 333, 334]) {
            table
                .register_unit(*unit, UnitWeights::uniform(mills))
                .unwrap();
        }
        (table, units)
    }

    fn statement_with_hours(units: &[UnitId], hours: &[i64]) -> ConsumptionStatement {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
        .unwrap();
        let mut statement = ConsumptionStatement::new(MeterKind::HeatingHours, range);
        for (unit, h) in units.iter().zip(hours) {
            statement.set_usage(*unit, Decimal::from(*h)).unwrap();
        }
        statement
    }

    #[test]
    fn test_split_conserves_total() {
        let allocator = ConsumptionAllocator::new(Rate::new(dec!(0.25))).unwrap();
        let (fixed, variable) = allocator.split(eur(dec!(600.00))).unwrap();

        assert_eq!(fixed.amount(), dec!(150.00));
        assert_eq!(variable.amount(), dec!(450.00));
        assert_eq!(fixed + variable, eur(dec!(600.00)));
    }

    #[test]
    fn test_heating_scenario() {
        // 600.00 at 25% fixed; hours [80, 150, 70] of 300 total
        let (table, units) = three_unit_table();
        let allocator = ConsumptionAllocator::new(Rate::new(dec!(0.25))).unwrap();
        let statement = statement_with_hours(&units, &[80, 150, 70]);

        let split = allocator
            .allocate(eur(dec!(600.00)), &table, &statement)
            .unwrap();

        assert_eq!(split.fixed_total(), eur(dec!(150.00)));
        assert_eq!(split.variable_total(), eur(dec!(450.00)));
        // Unit 2 holds 150/300 hours: exactly half the variable portion
        assert_eq!(split.variable.get(units[1]).amount(), dec!(225.00));

        let combined = split.combined().unwrap();
        assert_eq!(combined.total(), eur(dec!(600.00)));
    }

    #[test]
    fn test_zero_consumption_unit_owes_only_fixed() {
        let (table, units) = three_unit_table();
        let allocator = ConsumptionAllocator::default();
        let statement = statement_with_hours(&units, &[0, 200, 100]);

        let split = allocator
            .allocate(eur(dec!(400.00)), &table, &statement)
            .unwrap();

        assert!(split.variable.get(units[0]).is_zero());
        assert!(split.fixed.get(units[0]).is_positive());
    }

    #[test]
    fn test_all_zero_consumption_falls_back_to_weights() {
        let (table, units) = three_unit_table();
        let allocator = ConsumptionAllocator::default();
        let statement = statement_with_hours(&units, &[0, 0, 0]);

        let split = allocator
            .allocate(eur(dec!(400.00)), &table, &statement)
            .unwrap();

        let combined = split.combined().unwrap();
        assert_eq!(combined.total(), eur(dec!(400.00)));
        // Heating weights [333, 333, 334] decide everything
        assert!(combined.get(units[2]).amount() > combined.get(units[0]).amount());
    }

    #[test]
    fn test_fixed_portion_out_of_range() {
        let result = ConsumptionAllocator::new(Rate::new(dec!(1.5)));
        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::FixedPortionOutOfRange(dec!(1.5))
        );
    }
}
