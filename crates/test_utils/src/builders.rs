//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults, so
//! tests specify only the fields they care about.

use chrono::NaiveDate;
use core_kernel::{BuildingId, Currency, DateRange, Money, UnitId};
use domain_allocation::{
    ConsumptionStatement, DistributionPolicy, Expense, ExpenseCategory, MeterKind, UnitWeights,
    WeightTable,
};
use domain_ledger::{Ledger, Unit};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{MoneyFixtures, TemporalFixtures, WeightFixtures};

/// A fully wired test building: weight table, ledger, and registered units
pub struct TestBuilding {
    pub building_id: BuildingId,
    pub table: WeightTable,
    pub ledger: Ledger,
    /// Unit identifiers in ascending order
    pub units: Vec<UnitId>,
}

/// Builder for a test building
pub struct TestBuildingBuilder {
    currency: Currency,
    mills: Vec<u32>,
    heating_mills: Option<Vec<u32>>,
}

impl Default for TestBuildingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuildingBuilder {
    /// Three distinct-sized units, EUR
    pub fn new() -> Self {
        Self {
            currency: Currency::Eur,
            mills: WeightFixtures::three_distinct(),
            heating_mills: None,
        }
    }

    /// Sets the ledger currency
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Sets the general mills, one entry per unit
    pub fn with_mills(mut self, mills: Vec<u32>) -> Self {
        self.mills = mills;
        self
    }

    /// Sets heating mills distinct from the general mills
    pub fn with_heating_mills(mut self, mills: Vec<u32>) -> Self {
        self.heating_mills = Some(mills);
        self
    }

    /// Builds the weight table, ledger, and units
    pub fn build(self) -> TestBuilding {
        let building_id = BuildingId::new();
        let mut units: Vec<UnitId> = (0..self.mills.len()).map(|_| UnitId::new()).collect();
        units.sort();

        let mut table = WeightTable::new(building_id);
        let mut ledger = Ledger::new(building_id, self.currency);
        for (i, unit) in units.iter().enumerate() {
            let weights = match &self.heating_mills {
                Some(heating) => {
                    UnitWeights::uniform(self.mills[i]).with_heating(heating[i])
                }
                None => UnitWeights::uniform(self.mills[i]),
            };
            table
                .register_unit(*unit, weights)
                .expect("fixture weights are in range");
            ledger
                .register_unit(Unit::with_id(
                    *unit,
                    building_id,
                    format!("A-{}", 101 + i),
                ))
                .expect("fixture units are unique");
        }

        TestBuilding {
            building_id,
            table,
            ledger,
            units,
        }
    }
}

/// Builder for test expenses
pub struct ExpenseBuilder {
    building_id: BuildingId,
    amount: Money,
    category: ExpenseCategory,
    policy: DistributionPolicy,
    effective_date: NaiveDate,
    metering_period: Option<DateRange>,
}

impl ExpenseBuilder {
    /// An equal-share cleaning expense of 500.00 EUR
    pub fn new(building_id: BuildingId) -> Self {
        Self {
            building_id,
            amount: MoneyFixtures::eur_monthly_expenses(),
            category: ExpenseCategory::Cleaning,
            policy: DistributionPolicy::EqualShare,
            effective_date: TemporalFixtures::march_first(),
            metering_period: None,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_policy(mut self, policy: DistributionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = date;
        self
    }

    pub fn with_metering_period(mut self, range: DateRange) -> Self {
        self.metering_period = Some(range);
        self
    }

    /// A heating expense metered over the fixture period
    pub fn heating(building_id: BuildingId) -> Self {
        Self::new(building_id)
            .with_amount(MoneyFixtures::eur_heating_invoice())
            .with_category(ExpenseCategory::Heating)
            .with_policy(DistributionPolicy::Metered(MeterKind::HeatingHours))
            .with_metering_period(TemporalFixtures::march_range())
    }

    pub fn build(self) -> Expense {
        let due = self
            .effective_date
            .checked_add_days(chrono::Days::new(30))
            .expect("due date in range");
        let expense = Expense::new(
            self.building_id,
            self.amount,
            self.category,
            self.policy,
            self.effective_date,
            due,
        );
        match self.metering_period {
            Some(range) => expense.with_metering_period(range),
            None => expense,
        }
    }
}

/// Builder for consumption statements keyed by unit order
pub struct StatementBuilder {
    kind: MeterKind,
    range: DateRange,
    usage: Vec<(UnitId, Decimal)>,
}

impl StatementBuilder {
    pub fn new(kind: MeterKind) -> Self {
        Self {
            kind,
            range: TemporalFixtures::march_range(),
            usage: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_usage(mut self, unit: UnitId, usage: Decimal) -> Self {
        self.usage.push((unit, usage));
        self
    }

    /// Assigns the given usages to units pairwise
    pub fn with_usages(mut self, units: &[UnitId], usages: &[Decimal]) -> Self {
        for (unit, usage) in units.iter().zip(usages) {
            self.usage.push((*unit, *usage));
        }
        self
    }

    pub fn build(self) -> ConsumptionStatement {
        let mut statement = ConsumptionStatement::new(self.kind, self.range);
        for (unit, usage) in self.usage {
            statement
                .set_usage(unit, usage)
                .expect("fixture usage is non-negative");
        }
        statement
    }
}

/// The canonical heating scenario: 600.00 EUR, 25% fixed, usage 80/150/70
pub fn heating_statement(units: &[UnitId]) -> ConsumptionStatement {
    StatementBuilder::new(MeterKind::HeatingHours)
        .with_usages(units, &[dec!(80), dec!(150), dec!(70)])
        .build()
}
