//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful error
//! messages than bare `assert_eq!`.

use core_kernel::Money;
use domain_allocation::ShareMap;
use domain_ledger::Ledger;
use rust_decimal::Decimal;

/// Asserts that two Money values are equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies differ or the amounts differ by more than
/// `tolerance`.
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that the shares sum to the expense total exactly
///
/// # Panics
///
/// Panics if the sum of shares differs from `total` by any amount.
pub fn assert_shares_conserve(shares: &ShareMap, total: &Money) {
    let sum = shares.total();
    assert_eq!(
        &sum, total,
        "Shares do not conserve the total: sum={}, total={}",
        sum, total
    );
}

/// Asserts that every cached balance equals its replayed balance
///
/// # Panics
///
/// Panics on the first unit whose cached balance diverges from replay.
pub fn assert_ledger_consistent(ledger: &Ledger) {
    let now = chrono::Utc::now();
    for unit in ledger.units() {
        let stored = ledger
            .balance(unit.id)
            .expect("registered unit has a balance");
        let replayed = ledger
            .replay(unit.id, now)
            .expect("registered unit can be replayed");
        assert_eq!(
            stored, replayed,
            "Cached balance diverges from replay for unit {}: stored={}, replayed={}",
            unit.id, stored, replayed
        );
    }
}

/// Asserts that every entry chain links balance_after to the next
/// balance_before, in posting order
///
/// # Panics
///
/// Panics on the first broken link.
pub fn assert_entry_chains_intact(ledger: &Ledger) {
    for unit in ledger.units() {
        let entries = ledger.journal_for(unit.id);
        for pair in entries.windows(2) {
            assert_eq!(
                pair[0].balance_after, pair[1].balance_before,
                "Broken balance chain for unit {} at entry {}",
                unit.id, pair[1].id
            );
        }
    }
}
