//! End-to-end scenarios across allocation, ledger, and period close

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{AccountingPeriod, Currency, Money};
use domain_allocation::{
    DistributionEngine, DistributionPolicy, ExpenseCategory, WeightKind,
};
use domain_ledger::{
    ExpensePostingService, IntegrityValidator, Payment, PaymentMethod,
};
use domain_period::{AccountingMode, PeriodBook, SubAccount};
use test_utils::{
    assert_entry_chains_intact, assert_ledger_consistent, assert_shares_conserve,
    expense_minor_strategy, heating_statement, init_test_tracing, weight_vector_strategy,
    ExpenseBuilder, TestBuildingBuilder,
};

fn eur(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::Eur)
}

#[test]
fn test_heating_month_end_to_end() {
    init_test_tracing();
    // Equal heating weights, metered usage 80/150/70 of a 600.00 invoice
    let mut b = TestBuildingBuilder::new()
        .with_mills(vec![250, 450, 300])
        .with_heating_mills(vec![333, 333, 334])
        .build();
    let statement = heating_statement(&b.units);
    let expense = ExpenseBuilder::heating(b.building_id).build();

    let service = ExpensePostingService::new(&b.table);
    let entries = service
        .post_expense(&mut b.ledger, &expense, Some(&statement))
        .unwrap();

    // Fixed 150.00 by heating mills, variable 450.00 by usage
    let total: Money = entries
        .iter()
        .fold(Money::zero(Currency::Eur), |acc, e| acc + e.amount);
    assert_eq!(total, eur(dec!(600.00)));
    // Unit 2 used 150 of 300 hours: 225.00 variable plus its fixed share
    assert_eq!(
        b.ledger.balance(b.units[1]).unwrap(),
        eur(dec!(225.00) + dec!(49.95))
    );
    assert_ledger_consistent(&b.ledger);
    assert_entry_chains_intact(&b.ledger);
}

#[test]
fn test_two_month_cycle_with_carry() {
    init_test_tracing();
    let mut b = TestBuildingBuilder::new().build();
    let service = ExpensePostingService::new(&b.table);
    let mut book = PeriodBook::new(b.building_id, Currency::Eur);
    let march = AccountingPeriod::new(2026, 3).unwrap();
    let april = AccountingPeriod::new(2026, 4).unwrap();

    // March: 500.00 of expenses, 436.00 collected
    let expense = ExpenseBuilder::new(b.building_id)
        .with_policy(DistributionPolicy::Weighted(WeightKind::General))
        .build();
    service.post_expense(&mut b.ledger, &expense, None).unwrap();
    book.record_expense(march, SubAccount::Operating, expense.amount)
        .unwrap();

    for (unit, paid) in b.units.iter().zip([dec!(125.00), dec!(225.00), dec!(86.00)]) {
        let payment = Payment::new(
            *unit,
            eur(paid),
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            PaymentMethod::BankTransfer,
        );
        service.record_payment(&mut b.ledger, &payment).unwrap();
        book.record_payment(march, SubAccount::Operating, payment.amount)
            .unwrap();
    }
    book.close(march).unwrap();
    assert_eq!(
        book.snapshot(march).unwrap().carry_forward().unwrap(),
        eur(dec!(64.00))
    );

    // April: everyone pays up, including the carried 64.00
    let expense = ExpenseBuilder::new(b.building_id)
        .with_amount(eur(dec!(300.00)))
        .with_effective_date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap())
        .build();
    service.post_expense(&mut b.ledger, &expense, None).unwrap();
    book.record_expense(april, SubAccount::Operating, expense.amount)
        .unwrap();
    book.record_payment(april, SubAccount::Operating, eur(dec!(364.00)))
        .unwrap();

    let closed = book.close(april).unwrap();
    assert_eq!(closed.operating.carry_in, eur(dec!(64.00)));
    assert!(closed.carry_forward().unwrap().is_zero());
    assert_ledger_consistent(&b.ledger);
}

#[test]
fn test_hybrid_year_with_reserve_and_fees() {
    init_test_tracing();
    let b = TestBuildingBuilder::new().build();
    let mut book =
        PeriodBook::new(b.building_id, Currency::Eur).with_mode(AccountingMode::Hybrid);

    for month in 1..=12u32 {
        let p = AccountingPeriod::new(2026, month).unwrap();
        book.record_expense(p, SubAccount::Operating, eur(dec!(400.00))).unwrap();
        book.record_payment(p, SubAccount::Operating, eur(dec!(400.00))).unwrap();
        book.set_reserve_contribution(p, eur(dec!(120.00)));
        book.set_management_fee(p, eur(dec!(50.00)));
        book.record_payment(p, SubAccount::Management, eur(dec!(50.00))).unwrap();
        book.close(p).unwrap();
    }

    let december = book.snapshot(AccountingPeriod::new(2026, 12).unwrap()).unwrap();
    assert_eq!(december.reserve.carry_forward, Some(eur(dec!(1440.00))));
    assert_eq!(december.management.carry_forward, Some(eur(dec!(0.00))));
    assert!(december.carry_forward().unwrap().is_zero());

    // The reserve crosses into the new year intact
    let january = AccountingPeriod::new(2027, 1).unwrap();
    let closed = book.close(january).unwrap();
    assert_eq!(closed.reserve.carry_in, eur(dec!(1440.00)));
}

#[test]
fn test_audit_after_busy_quarter() {
    init_test_tracing();
    let mut b = TestBuildingBuilder::new()
        .with_mills(vec![180, 220, 150, 250, 200])
        .build();
    let service = ExpensePostingService::new(&b.table);

    for (month, amount, category) in [
        (1u32, dec!(412.37), ExpenseCategory::Maintenance),
        (2, dec!(98.01), ExpenseCategory::Elevator),
        (3, dec!(1250.00), ExpenseCategory::Repairs),
    ] {
        let expense = ExpenseBuilder::new(b.building_id)
            .with_amount(eur(amount))
            .with_category(category)
            .with_policy(DistributionPolicy::Weighted(WeightKind::General))
            .with_effective_date(NaiveDate::from_ymd_opt(2026, month, 5).unwrap())
            .build();
        service.post_expense(&mut b.ledger, &expense, None).unwrap();
    }
    for unit in &b.units {
        let payment = Payment::new(
            *unit,
            eur(dec!(150.00)),
            NaiveDate::from_ymd_opt(2026, 3, 28).unwrap(),
            PaymentMethod::DirectDebit,
        );
        b.ledger.post_payment(&payment).unwrap();
    }

    let validator = IntegrityValidator::new();
    for report in validator.validate_all(&b.ledger).unwrap() {
        assert!(report.is_clean());
        assert!(report.chain_breaks.is_empty());
    }
}

proptest! {
    #[test]
    fn test_any_weighted_expense_conserves_and_balances(
        mills in weight_vector_strategy(),
        minor in expense_minor_strategy(),
    ) {
        let mut b = TestBuildingBuilder::new().with_mills(mills).build();
        let amount = Money::from_minor(minor, Currency::Eur);
        let expense = ExpenseBuilder::new(b.building_id)
            .with_amount(amount)
            .with_policy(DistributionPolicy::Weighted(WeightKind::General))
            .build();

        let engine = DistributionEngine::new(&b.table);
        let shares = engine.allocate(&expense, None).unwrap();
        assert_shares_conserve(&shares, &amount);

        b.ledger.charge_expense(&expense, &shares).unwrap();
        let total: Money = b
            .units
            .iter()
            .fold(Money::zero(Currency::Eur), |acc, unit| {
                acc + b.ledger.balance(*unit).unwrap()
            });
        prop_assert_eq!(total, amount);
        assert_ledger_consistent(&b.ledger);
    }
}
