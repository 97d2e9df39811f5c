//! Shared expenses awaiting distribution
//!
//! An expense is created once and never edited after its shares are
//! computed; corrections are new expenses or explicit adjustment entries in
//! the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{BuildingId, DateRange, ExpenseId, Money};

use crate::distribution::DistributionPolicy;

/// What kind of shared cost an expense covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Heating,
    Elevator,
    Cleaning,
    Maintenance,
    Repairs,
    Insurance,
    Administration,
    ReserveFund,
    Utilities,
    Other,
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpenseCategory::Heating => "heating",
            ExpenseCategory::Elevator => "elevator",
            ExpenseCategory::Cleaning => "cleaning",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Repairs => "repairs",
            ExpenseCategory::Insurance => "insurance",
            ExpenseCategory::Administration => "administration",
            ExpenseCategory::ReserveFund => "reserve-fund",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// One shared expense registered against a building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier
    pub id: ExpenseId,
    /// Building the cost belongs to
    pub building_id: BuildingId,
    /// Total amount to distribute
    pub amount: Money,
    /// Cost category
    pub category: ExpenseCategory,
    /// How the amount is apportioned
    pub policy: DistributionPolicy,
    /// Date the cost is effective for (decides its accounting period)
    pub effective_date: NaiveDate,
    /// Date unit shares fall due
    pub due_date: NaiveDate,
    /// Metering period for consumption-based policies
    pub metering_period: Option<DateRange>,
    /// Free-text label
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Registers a new expense
    pub fn new(
        building_id: BuildingId,
        amount: Money,
        category: ExpenseCategory,
        policy: DistributionPolicy,
        effective_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: ExpenseId::new_v7(),
            building_id,
            amount,
            category,
            policy,
            effective_date,
            due_date,
            metering_period: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Links the consumption period a metered policy covers
    pub fn with_metering_period(mut self, period: DateRange) -> Self {
        self.metering_period = Some(period);
        self
    }

    /// Adds a free-text label
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
