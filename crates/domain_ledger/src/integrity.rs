//! Ledger integrity auditing
//!
//! The validator replays a unit's entries and compares the result against
//! the cached balance, checks the balance-before/balance-after chain, and
//! flags same-day entries that look like double postings. It never mutates
//! anything on its own; `repair` is a separate, explicit operation.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use core_kernel::{LedgerEntryId, Money, UnitId};
use rust_decimal::Decimal;

use crate::entry::EntryKind;
use crate::error::{LedgerConsistencyError, LedgerError};
use crate::ledger::Ledger;

/// A group of same-day entries with identical kind and amount
///
/// Flagged for human review only. Legitimate duplicates exist (two equal
/// cash payments on one day), so nothing is removed automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub unit_id: UnitId,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub amount: Money,
    /// Identifiers of every entry in the group
    pub entries: Vec<LedgerEntryId>,
}

/// Outcome of auditing one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub unit_id: UnitId,
    pub stored_balance: Money,
    pub replayed_balance: Money,
    /// stored minus replayed
    pub discrepancy: Money,
    /// Tolerance the discrepancy was judged against
    pub epsilon: Money,
    pub duplicate_candidates: Vec<DuplicateCandidate>,
    /// Entries whose balance-before does not match the preceding entry's
    /// balance-after, in posting order
    pub chain_breaks: Vec<LedgerEntryId>,
}

impl IntegrityReport {
    /// True when the discrepancy is within epsilon and the chain is intact
    ///
    /// Duplicate candidates do not make a report unclean; they are advisory.
    pub fn is_clean(&self) -> bool {
        self.discrepancy.abs().amount() <= self.epsilon.amount() && self.chain_breaks.is_empty()
    }

    /// The divergence as an error, when the report is not clean
    pub fn divergence(&self) -> Option<LedgerConsistencyError> {
        if self.discrepancy.abs().amount() > self.epsilon.amount() {
            Some(LedgerConsistencyError::BalanceDivergence {
                unit: self.unit_id,
                stored: self.stored_balance.amount(),
                replayed: self.replayed_balance.amount(),
            })
        } else {
            self.chain_breaks
                .first()
                .map(|entry| LedgerConsistencyError::BrokenChain {
                    unit: self.unit_id,
                    entry: *entry,
                })
        }
    }
}

/// Audits cached balances against entry replay
#[derive(Debug, Clone, Default)]
pub struct IntegrityValidator {
    /// Tolerated absolute divergence; one minor unit of the ledger's
    /// currency when unset
    epsilon: Option<Decimal>,
}

impl IntegrityValidator {
    /// Validator tolerating one minor unit of divergence
    pub fn new() -> Self {
        Self { epsilon: None }
    }

    /// Overrides the divergence tolerance
    pub fn with_epsilon(mut self, epsilon: Decimal) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Audits one unit
    ///
    /// # Errors
    ///
    /// `UnknownUnit` if the unit is not registered.
    pub fn validate(&self, ledger: &Ledger, unit: UnitId) -> Result<IntegrityReport, LedgerError> {
        let stored_balance = ledger.balance(unit)?;
        let replayed_balance = ledger.replay(unit, Utc::now())?;
        let discrepancy = stored_balance.checked_sub(&replayed_balance)?;
        let epsilon = self
            .epsilon
            .unwrap_or_else(|| ledger.currency().minor_unit());

        // Posting order: the chain invariant does not hold in value-date
        // order once an entry is backdated
        let entries = ledger.journal_for(unit);

        let mut chain_breaks = Vec::new();
        for pair in entries.windows(2) {
            if pair[1].balance_before != pair[0].balance_after {
                chain_breaks.push(pair[1].id);
            }
        }

        let mut groups: BTreeMap<(NaiveDate, EntryKind, Decimal), Vec<LedgerEntryId>> =
            BTreeMap::new();
        for entry in &entries {
            groups
                .entry((
                    entry.posted_at.date_naive(),
                    entry.kind,
                    entry.amount.amount(),
                ))
                .or_default()
                .push(entry.id);
        }
        let duplicate_candidates = groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((date, kind, amount), ids)| DuplicateCandidate {
                unit_id: unit,
                date,
                kind,
                amount: Money::new(amount, ledger.currency()),
                entries: ids,
            })
            .collect();

        Ok(IntegrityReport {
            unit_id: unit,
            stored_balance,
            replayed_balance,
            discrepancy,
            epsilon: Money::new(epsilon, ledger.currency()),
            duplicate_candidates,
            chain_breaks,
        })
    }

    /// Audits every registered unit, in identifier order
    pub fn validate_all(&self, ledger: &Ledger) -> Result<Vec<IntegrityReport>, LedgerError> {
        let units: Vec<UnitId> = ledger.units().map(|u| u.id).collect();
        units
            .into_iter()
            .map(|unit| self.validate(ledger, unit))
            .collect()
    }

    /// Resets a unit's cached balance to the replayed value
    ///
    /// Returns the correction that was applied, or `None` when the cache
    /// already matched. Repair is always explicit; validation alone never
    /// changes the ledger.
    pub fn repair(&self, ledger: &mut Ledger, unit: UnitId) -> Result<Option<Money>, LedgerError> {
        let report = self.validate(ledger, unit)?;
        if report.discrepancy.is_zero() {
            return Ok(None);
        }
        warn!(
            unit = %unit,
            stored = %report.stored_balance,
            replayed = %report.replayed_balance,
            "repairing cached balance from replay"
        );
        ledger.overwrite_cached_balance(unit, report.replayed_balance);
        Ok(Some(report.discrepancy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::entry::EntryReference;
    use crate::payment::{Payment, PaymentMethod};
    use crate::unit::Unit;
    use core_kernel::{BuildingId, Currency};

    fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::Eur)
    }

    fn ledger_with_unit() -> (Ledger, UnitId) {
        let building = BuildingId::new();
        let mut ledger = Ledger::new(building, Currency::Eur);
        let unit = Unit::new(building, "A-101");
        let id = unit.id;
        ledger.register_unit(unit).unwrap();
        (ledger, id)
    }

    #[test]
    fn test_clean_ledger_reports_clean() {
        let (mut ledger, unit) = ledger_with_unit();
        ledger
            .append(
                unit,
                eur(dec!(120.00)),
                EntryKind::Charge,
                EntryReference::Adjustment("opening charge".into()),
                Utc::now(),
            )
            .unwrap();

        let report = IntegrityValidator::new().validate(&ledger, unit).unwrap();
        assert!(report.is_clean());
        assert!(report.discrepancy.is_zero());
        assert!(report.chain_breaks.is_empty());
    }

    #[test]
    fn test_corrupted_cache_is_flagged_and_repaired() {
        let (mut ledger, unit) = ledger_with_unit();
        ledger
            .append(
                unit,
                eur(dec!(120.00)),
                EntryKind::Charge,
                EntryReference::Adjustment("opening charge".into()),
                Utc::now(),
            )
            .unwrap();
        // Simulated cache corruption
        ledger.overwrite_cached_balance(unit, eur(dec!(95.00)));

        let validator = IntegrityValidator::new();
        let report = validator.validate(&ledger, unit).unwrap();
        assert!(!report.is_clean());
        assert_eq!(report.discrepancy, eur(dec!(-25.00)));
        assert!(matches!(
            report.divergence(),
            Some(LedgerConsistencyError::BalanceDivergence { .. })
        ));

        let correction = validator.repair(&mut ledger, unit).unwrap();
        assert_eq!(correction, Some(eur(dec!(-25.00))));
        assert_eq!(ledger.balance(unit).unwrap(), eur(dec!(120.00)));
        assert!(validator.validate(&ledger, unit).unwrap().is_clean());
    }

    #[test]
    fn test_backdated_payment_keeps_chain_intact() {
        let (mut ledger, unit) = ledger_with_unit();
        ledger
            .append(
                unit,
                eur(dec!(120.00)),
                EntryKind::Charge,
                EntryReference::Adjustment("march charge".into()),
                NaiveDate::from_ymd_opt(2026, 3, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc(),
            )
            .unwrap();
        // Bank statement arrives late; the payment is value-dated before
        // the charge
        let payment = Payment::new(
            unit,
            eur(dec!(80.00)),
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            PaymentMethod::BankTransfer,
        );
        ledger.post_payment(&payment).unwrap();

        let report = IntegrityValidator::new().validate(&ledger, unit).unwrap();
        assert!(report.chain_breaks.is_empty());
        assert!(report.discrepancy.is_zero());
        assert!(report.is_clean(), "unclean report: {:?}", report);
        assert_eq!(ledger.balance(unit).unwrap(), eur(dec!(40.00)));
    }

    #[test]
    fn test_repair_is_a_no_op_on_clean_ledger() {
        let (mut ledger, unit) = ledger_with_unit();
        let correction = IntegrityValidator::new().repair(&mut ledger, unit).unwrap();
        assert_eq!(correction, None);
    }

    #[test]
    fn test_duplicate_candidates_grouped_by_day_kind_amount() {
        let (mut ledger, unit) = ledger_with_unit();
        let day = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        for _ in 0..2 {
            let payment = Payment::new(unit, eur(dec!(80.00)), day, PaymentMethod::Cash);
            ledger.post_payment(&payment).unwrap();
        }
        // Same day, different amount: not a candidate
        let other = Payment::new(unit, eur(dec!(30.00)), day, PaymentMethod::Cash);
        ledger.post_payment(&other).unwrap();

        let report = IntegrityValidator::new().validate(&ledger, unit).unwrap();
        assert_eq!(report.duplicate_candidates.len(), 1);
        let candidate = &report.duplicate_candidates[0];
        assert_eq!(candidate.date, day);
        assert_eq!(candidate.kind, EntryKind::Payment);
        assert_eq!(candidate.amount, eur(dec!(-80.00)));
        assert_eq!(candidate.entries.len(), 2);
        // Advisory only
        assert!(report.is_clean());
    }

    #[test]
    fn test_sub_epsilon_discrepancy_is_clean() {
        let (mut ledger, unit) = ledger_with_unit();
        ledger
            .append(
                unit,
                eur(dec!(50.00)),
                EntryKind::Charge,
                EntryReference::Adjustment("opening charge".into()),
                Utc::now(),
            )
            .unwrap();
        ledger.overwrite_cached_balance(unit, eur(dec!(50.01)));

        let report = IntegrityValidator::new().validate(&ledger, unit).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.discrepancy, eur(dec!(0.01)));
    }
}
