//! Apartment units

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BuildingId, UnitId};

/// One apartment in a building
///
/// Weights live in the allocation domain's `WeightTable`; the unit's current
/// balance lives in the `Ledger`. This record carries identity only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier
    pub id: UnitId,
    /// Owning building
    pub building_id: BuildingId,
    /// Human designation, e.g. "A-101"
    pub designation: String,
    /// Onboarding timestamp
    pub created_at: DateTime<Utc>,
}

impl Unit {
    /// Onboards a new unit
    pub fn new(building_id: BuildingId, designation: impl Into<String>) -> Self {
        Self {
            id: UnitId::new_v7(),
            building_id,
            designation: designation.into(),
            created_at: Utc::now(),
        }
    }

    /// Onboards a unit under a pre-assigned identifier
    pub fn with_id(id: UnitId, building_id: BuildingId, designation: impl Into<String>) -> Self {
        Self {
            id,
            building_id,
            designation: designation.into(),
            created_at: Utc::now(),
        }
    }
}
