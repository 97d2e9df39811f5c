//! Property-Based Test Generators
//!
//! Proptest strategies for generating random test data that maintains
//! domain invariants.

use core_kernel::{AccountingPeriod, Currency, Money, UnitId};
use domain_allocation::MILLS_SCALE;
use proptest::prelude::*;

/// Strategy for the currencies the engine supports
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::Eur),
        Just(Currency::Usd),
        Just(Currency::Gbp),
        Just(Currency::Chf),
        Just(Currency::Czk),
        Just(Currency::Isk),
    ]
}

/// Strategy for positive expense amounts in minor units
pub fn expense_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

/// Strategy for positive EUR amounts
pub fn positive_eur_strategy() -> impl Strategy<Value = Money> {
    expense_minor_strategy().prop_map(|minor| Money::from_minor(minor, Currency::Eur))
}

/// Strategy for a single unit weight in mills
pub fn mills_strategy() -> impl Strategy<Value = u32> {
    0u32..=MILLS_SCALE
}

/// Strategy for a building's worth of weights, at least one non-zero
pub fn weight_vector_strategy() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(mills_strategy(), 1..20)
        .prop_filter("at least one non-zero weight", |mills| {
            mills.iter().any(|m| *m > 0)
        })
}

/// Strategy for a sorted vector of distinct unit identifiers
pub fn unit_ids_strategy(count: usize) -> impl Strategy<Value = Vec<UnitId>> {
    Just(count).prop_map(|n| {
        let mut units: Vec<UnitId> = (0..n).map(|_| UnitId::new()).collect();
        units.sort();
        units
    })
}

/// Strategy for valid accounting periods
pub fn period_strategy() -> impl Strategy<Value = AccountingPeriod> {
    (2000i32..2100, 1u32..=12).prop_map(|(year, month)| {
        AccountingPeriod::new(year, month).expect("generated period is valid")
    })
}
