//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities. Fixtures are deterministic
//! and predictable so tests can assert on exact amounts.

use chrono::NaiveDate;
use core_kernel::{AccountingPeriod, Currency, DateRange, Money};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A standard EUR amount
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::Eur)
    }

    /// A typical monthly building expense total
    pub fn eur_monthly_expenses() -> Money {
        Money::new(dec!(500.00), Currency::Eur)
    }

    /// A typical heating invoice
    pub fn eur_heating_invoice() -> Money {
        Money::new(dec!(600.00), Currency::Eur)
    }

    /// An amount that does not divide evenly by three
    pub fn eur_indivisible() -> Money {
        Money::new(dec!(100.01), Currency::Eur)
    }

    /// A zero amount
    pub fn eur_zero() -> Money {
        Money::zero(Currency::Eur)
    }

    /// A CZK amount for currency mismatch tests
    pub fn czk_100() -> Money {
        Money::new(dec!(100.00), Currency::Czk)
    }
}

/// Fixture for dates and periods
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The accounting period most fixtures live in
    pub fn march() -> AccountingPeriod {
        AccountingPeriod::new(2026, 3).expect("valid period")
    }

    /// The period after `march`
    pub fn april() -> AccountingPeriod {
        AccountingPeriod::new(2026, 4).expect("valid period")
    }

    /// December, for year-rollover tests
    pub fn december() -> AccountingPeriod {
        AccountingPeriod::new(2026, 12).expect("valid period")
    }

    /// First day of the fixture period
    pub fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
    }

    /// Mid-month date for payments
    pub fn march_mid() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
    }

    /// The fixture period as an inclusive date range
    pub fn march_range() -> DateRange {
        DateRange::for_period(Self::march())
    }
}

/// Mills distributions used across the suite
pub struct WeightFixtures;

impl WeightFixtures {
    /// Three units of equal size, total 999 mills
    pub fn three_equal() -> Vec<u32> {
        vec![333, 333, 334]
    }

    /// Three units of distinct sizes, total 1000 mills
    pub fn three_distinct() -> Vec<u32> {
        vec![250, 450, 300]
    }

    /// Five units of a small house, total 1000 mills
    pub fn five_unit_house() -> Vec<u32> {
        vec![180, 220, 150, 250, 200]
    }
}
