//! Posting workflow
//!
//! Ties the allocation engine to the ledger: allocate an expense into
//! per-unit shares, then fan the shares out atomically.

use tracing::info;

use domain_allocation::{
    ConsumptionAllocator, ConsumptionStatement, DistributionEngine, Expense, WeightTable,
};

use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::payment::Payment;

/// Allocates expenses and posts the resulting shares to a ledger
pub struct ExpensePostingService<'a> {
    engine: DistributionEngine<'a>,
}

impl<'a> ExpensePostingService<'a> {
    /// Service over a building's weight table, with default heating policy
    pub fn new(weights: &'a WeightTable) -> Self {
        Self {
            engine: DistributionEngine::new(weights),
        }
    }

    /// Overrides the heating allocator
    pub fn with_heating_allocator(mut self, heating: ConsumptionAllocator) -> Self {
        self.engine = self.engine.with_heating_allocator(heating);
        self
    }

    /// Allocates the expense per its policy and charges every unit
    ///
    /// Allocation errors surface before the ledger is touched; the fan-out
    /// itself is atomic.
    ///
    /// # Errors
    ///
    /// Allocation failures (configuration, policy, data integrity) and
    /// ledger failures (unknown unit, conservation mismatch).
    pub fn post_expense(
        &self,
        ledger: &mut Ledger,
        expense: &Expense,
        statement: Option<&ConsumptionStatement>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let shares = self.engine.allocate(expense, statement)?;
        let entries = ledger.charge_expense(expense, &shares)?;
        info!(
            expense = %expense.id,
            policy = %expense.policy,
            entries = entries.len(),
            "expense posted"
        );
        Ok(entries)
    }

    /// Records a payment against the ledger
    pub fn record_payment(
        &self,
        ledger: &mut Ledger,
        payment: &Payment,
    ) -> Result<LedgerEntry, LedgerError> {
        ledger.post_payment(payment)
    }
}
