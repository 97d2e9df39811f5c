//! Integration tests for the balance ledger

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use core_kernel::{AccountingPeriod, BuildingId, Currency, DateRange, Money, UnitId};
use domain_allocation::{
    ConsumptionStatement, DistributionPolicy, Expense, ExpenseCategory, MeterKind, UnitWeights,
    WeightKind, WeightTable,
};
use domain_ledger::{
    EntryKind, ExpensePostingService, IntegrityValidator, Ledger, LedgerError, Payment,
    PaymentMethod, Unit,
};

fn eur(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::Eur)
}

struct Building {
    table: WeightTable,
    ledger: Ledger,
    units: Vec<UnitId>,
}

fn building_with_mills(mills: &[u32]) -> Building {
    let building = BuildingId::new();
    let mut units: Vec<UnitId> = (0..mills.len()).map(|_| UnitId::new()).collect();
    units.sort();

    let mut table = WeightTable::new(building);
    let mut ledger = Ledger::new(building, Currency::Eur);
    for (i, (unit, m)) in units.iter().zip(mills).enumerate() {
        table.register_unit(*unit, UnitWeights::uniform(*m)).unwrap();
        ledger
            .register_unit(Unit::with_id(*unit, building, format!("A-{}", 101 + i)))
            .unwrap();
    }
    Building { table, ledger, units }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod posting_tests {
    use super::*;

    #[test]
    fn test_weighted_expense_posts_conserved_charges() {
        let mut b = building_with_mills(&[333, 333, 334]);
        let service = ExpensePostingService::new(&b.table);
        let expense = Expense::new(
            b.ledger.building_id(),
            eur(dec!(1000.00)),
            ExpenseCategory::Maintenance,
            DistributionPolicy::Weighted(WeightKind::General),
            date(2026, 3, 1),
            date(2026, 3, 31),
        );

        let entries = service
            .post_expense(&mut b.ledger, &expense, None)
            .unwrap();

        let total: Money = entries
            .iter()
            .fold(Money::zero(Currency::Eur), |acc, e| acc + e.amount);
        assert_eq!(total, eur(dec!(1000.00)));
        assert_eq!(b.ledger.balance(b.units[2]).unwrap(), eur(dec!(334.00)));
    }

    #[test]
    fn test_metered_expense_with_statement() {
        let mut b = building_with_mills(&[250, 450, 300]);
        let service = ExpensePostingService::new(&b.table);
        let range = DateRange::new(date(2026, 3, 1), date(2026, 3, 31)).unwrap();
        let mut statement = ConsumptionStatement::new(MeterKind::Water, range);
        statement.set_usage(b.units[0], dec!(10)).unwrap();
        statement.set_usage(b.units[1], dec!(30)).unwrap();
        statement.set_usage(b.units[2], dec!(10)).unwrap();

        let expense = Expense::new(
            b.ledger.building_id(),
            eur(dec!(250.00)),
            ExpenseCategory::Utilities,
            DistributionPolicy::Metered(MeterKind::Water),
            date(2026, 3, 31),
            date(2026, 4, 30),
        )
        .with_metering_period(range);

        service
            .post_expense(&mut b.ledger, &expense, Some(&statement))
            .unwrap();

        assert_eq!(b.ledger.balance(b.units[0]).unwrap(), eur(dec!(50.00)));
        assert_eq!(b.ledger.balance(b.units[1]).unwrap(), eur(dec!(150.00)));
        assert_eq!(b.ledger.balance(b.units[2]).unwrap(), eur(dec!(50.00)));
    }

    #[test]
    fn test_failed_fan_out_is_atomic() {
        let mut b = building_with_mills(&[500, 500]);
        let expense = Expense::new(
            b.ledger.building_id(),
            eur(dec!(100.00)),
            ExpenseCategory::Cleaning,
            DistributionPolicy::EqualShare,
            date(2026, 3, 1),
            date(2026, 3, 31),
        );
        // Shares built against a table that knows a unit the ledger does not
        let stranger = UnitId::new();
        let mut wrong_table = WeightTable::new(b.ledger.building_id());
        wrong_table
            .register_unit(b.units[0], UnitWeights::uniform(500))
            .unwrap();
        wrong_table
            .register_unit(stranger, UnitWeights::uniform(500))
            .unwrap();
        let service = ExpensePostingService::new(&wrong_table);

        let result = service.post_expense(&mut b.ledger, &expense, None);

        assert_eq!(result, Err(LedgerError::UnknownUnit(stranger)));
        assert!(b.ledger.entries().is_empty());
        assert!(b.ledger.balance(b.units[0]).unwrap().is_zero());
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_charge_payment_adjustment_cycle() {
        let mut b = building_with_mills(&[600, 400]);
        let service = ExpensePostingService::new(&b.table);
        let expense = Expense::new(
            b.ledger.building_id(),
            eur(dec!(500.00)),
            ExpenseCategory::Insurance,
            DistributionPolicy::Weighted(WeightKind::General),
            date(2026, 6, 1),
            date(2026, 6, 30),
        );
        service.post_expense(&mut b.ledger, &expense, None).unwrap();

        let payment = Payment::new(
            b.units[0],
            eur(dec!(300.00)),
            date(2026, 6, 15),
            PaymentMethod::BankTransfer,
        );
        service.record_payment(&mut b.ledger, &payment).unwrap();

        // Unit 0: 300 charge, 300 payment
        assert!(b.ledger.balance(b.units[0]).unwrap().is_zero());
        // Unit 1 still owes its 200 share
        assert_eq!(b.ledger.balance(b.units[1]).unwrap(), eur(dec!(200.00)));

        // Goodwill credit
        b.ledger
            .post_adjustment(b.units[1], eur(dec!(-200.00)), "waived after dispute")
            .unwrap();
        assert!(b.ledger.balance(b.units[1]).unwrap().is_zero());

        let entries = b.ledger.entries_for(b.units[1]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].kind, EntryKind::Adjustment);
    }

    #[test]
    fn test_overpayment_leaves_credit_balance() {
        let mut b = building_with_mills(&[1000]);
        let service = ExpensePostingService::new(&b.table);
        let expense = Expense::new(
            b.ledger.building_id(),
            eur(dec!(120.00)),
            ExpenseCategory::Administration,
            DistributionPolicy::EqualShare,
            date(2026, 2, 1),
            date(2026, 2, 28),
        );
        service.post_expense(&mut b.ledger, &expense, None).unwrap();

        let payment = Payment::new(
            b.units[0],
            eur(dec!(150.00)),
            date(2026, 2, 10),
            PaymentMethod::StandingOrder,
        );
        b.ledger.post_payment(&payment).unwrap();

        assert_eq!(b.ledger.balance(b.units[0]).unwrap(), eur(dec!(-30.00)));
    }

    #[test]
    fn test_monthly_statement_carries_opening_balance() {
        let mut b = building_with_mills(&[1000]);
        let service = ExpensePostingService::new(&b.table);
        for month in [1u32, 2] {
            let expense = Expense::new(
                b.ledger.building_id(),
                eur(dec!(100.00)),
                ExpenseCategory::Cleaning,
                DistributionPolicy::EqualShare,
                date(2026, month, 1),
                date(2026, month, 28),
            );
            service.post_expense(&mut b.ledger, &expense, None).unwrap();
        }

        let feb = AccountingPeriod::new(2026, 2).unwrap();
        let statement = b.ledger.monthly_statement(b.units[0], feb).unwrap();
        assert_eq!(statement.opening_balance, eur(dec!(100.00)));
        assert_eq!(statement.charges, eur(dec!(100.00)));
        assert_eq!(statement.closing_balance, eur(dec!(200.00)));
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Replay always agrees with the cached balance, whatever mix of
        /// charges and payments was posted
        #[test]
        fn replay_matches_cache(
            charges in proptest::collection::vec(1i64..500_000, 1..8),
            paid in proptest::collection::vec(1i64..500_000, 0..8),
        ) {
            let mut b = building_with_mills(&[400, 350, 250]);
            let service = ExpensePostingService::new(&b.table);
            for (i, cents) in charges.iter().enumerate() {
                let day = (i % 27 + 1) as u32;
                let expense = Expense::new(
                    b.ledger.building_id(),
                    Money::from_minor(*cents, Currency::Eur),
                    ExpenseCategory::Maintenance,
                    DistributionPolicy::Weighted(WeightKind::General),
                    date(2026, 6, day),
                    date(2026, 7, day),
                );
                service.post_expense(&mut b.ledger, &expense, None).unwrap();
            }
            for (i, cents) in paid.iter().enumerate() {
                let unit = b.units[i % b.units.len()];
                let payment = Payment::new(
                    unit,
                    Money::from_minor(*cents, Currency::Eur),
                    date(2026, 6, (i % 27 + 1) as u32),
                    PaymentMethod::BankTransfer,
                );
                b.ledger.post_payment(&payment).unwrap();
            }

            for unit in &b.units {
                prop_assert_eq!(
                    b.ledger.replay(*unit, Utc::now()).unwrap(),
                    b.ledger.balance(*unit).unwrap()
                );
            }
        }
    }
}

mod integrity_tests {
    use super::*;

    #[test]
    fn test_replay_is_ground_truth_after_busy_month() {
        let mut b = building_with_mills(&[200, 300, 500]);
        let service = ExpensePostingService::new(&b.table);
        for (day, amount) in [(1u32, dec!(840.00)), (10, dec!(123.45)), (20, dec!(66.67))] {
            let expense = Expense::new(
                b.ledger.building_id(),
                eur(amount),
                ExpenseCategory::Repairs,
                DistributionPolicy::Weighted(WeightKind::General),
                date(2026, 7, day),
                date(2026, 7, 31),
            );
            service.post_expense(&mut b.ledger, &expense, None).unwrap();
        }
        for unit in &b.units {
            let payment = Payment::new(*unit, eur(dec!(100.00)), date(2026, 7, 25), PaymentMethod::DirectDebit);
            b.ledger.post_payment(&payment).unwrap();
        }

        let validator = IntegrityValidator::new();
        for report in validator.validate_all(&b.ledger).unwrap() {
            assert!(report.is_clean(), "unclean report: {:?}", report);
            assert_eq!(report.stored_balance, report.replayed_balance);
        }

        for unit in &b.units {
            assert_eq!(
                b.ledger.replay(*unit, Utc::now()).unwrap(),
                b.ledger.balance(*unit).unwrap()
            );
        }
    }

    #[test]
    fn test_duplicate_posting_is_surfaced_not_removed() {
        let mut b = building_with_mills(&[500, 500]);
        let service = ExpensePostingService::new(&b.table);
        let building = b.ledger.building_id();
        let make_expense = || {
            Expense::new(
                building,
                eur(dec!(200.00)),
                ExpenseCategory::Cleaning,
                DistributionPolicy::EqualShare,
                date(2026, 8, 3),
                date(2026, 8, 31),
            )
        };
        // The same invoice keyed in twice
        service
            .post_expense(&mut b.ledger, &make_expense(), None)
            .unwrap();
        service
            .post_expense(&mut b.ledger, &make_expense(), None)
            .unwrap();

        let report = IntegrityValidator::new()
            .validate(&b.ledger, b.units[0])
            .unwrap();
        assert_eq!(report.duplicate_candidates.len(), 1);
        assert_eq!(report.duplicate_candidates[0].entries.len(), 2);
        // Both postings remain on the ledger
        assert_eq!(b.ledger.entries_for(b.units[0]).len(), 2);
        assert_eq!(b.ledger.balance(b.units[0]).unwrap(), eur(dec!(200.00)));
    }
}
