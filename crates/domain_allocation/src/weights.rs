//! Ownership weight tables
//!
//! Each unit carries three weights on the mills scale (0-1000): a general
//! ownership weight plus dedicated heating and elevator weights. Weighted
//! policies proportion an expense by `unit mills / total mills` for the
//! relevant kind. Weights change only through explicit administrative
//! updates; nothing in the engine mutates them implicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use core_kernel::{BuildingId, UnitId};

use crate::error::ConfigurationError;

/// Upper bound of the per-unit weight scale
pub const MILLS_SCALE: u32 = 1000;

/// The weight dimension a policy distributes by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    /// General ownership share
    General,
    /// Heating cost share
    Heating,
    /// Elevator cost share
    Elevator,
}

impl fmt::Display for WeightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeightKind::General => "general",
            WeightKind::Heating => "heating",
            WeightKind::Elevator => "elevator",
        };
        write!(f, "{}", name)
    }
}

/// One unit's weights across all kinds, in mills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitWeights {
    pub general: u32,
    pub heating: u32,
    pub elevator: u32,
}

impl UnitWeights {
    /// Creates weights where every kind shares the general mills
    pub fn uniform(mills: u32) -> Self {
        Self {
            general: mills,
            heating: mills,
            elevator: mills,
        }
    }

    /// Sets the heating weight
    pub fn with_heating(mut self, mills: u32) -> Self {
        self.heating = mills;
        self
    }

    /// Sets the elevator weight
    pub fn with_elevator(mut self, mills: u32) -> Self {
        self.elevator = mills;
        self
    }

    /// Returns the mills for a kind
    pub fn get(&self, kind: WeightKind) -> u32 {
        match kind {
            WeightKind::General => self.general,
            WeightKind::Heating => self.heating,
            WeightKind::Elevator => self.elevator,
        }
    }

    fn set(&mut self, kind: WeightKind, mills: u32) {
        match kind {
            WeightKind::General => self.general = mills,
            WeightKind::Heating => self.heating = mills,
            WeightKind::Elevator => self.elevator = mills,
        }
    }

    fn largest(&self) -> u32 {
        self.general.max(self.heating).max(self.elevator)
    }
}

/// Per-building table of unit weights
///
/// Iteration order is by `UnitId`, which keeps every downstream distribution
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTable {
    building_id: BuildingId,
    weights: BTreeMap<UnitId, UnitWeights>,
}

impl WeightTable {
    /// Creates an empty table for a building
    pub fn new(building_id: BuildingId) -> Self {
        Self {
            building_id,
            weights: BTreeMap::new(),
        }
    }

    /// Returns the building this table belongs to
    pub fn building_id(&self) -> BuildingId {
        self.building_id
    }

    /// Registers a unit with its weights, replacing any previous entry
    ///
    /// # Errors
    ///
    /// Returns `WeightOutOfRange` if any kind exceeds the mills scale.
    pub fn register_unit(
        &mut self,
        unit: UnitId,
        weights: UnitWeights,
    ) -> Result<(), ConfigurationError> {
        if weights.largest() > MILLS_SCALE {
            return Err(ConfigurationError::WeightOutOfRange {
                unit,
                mills: weights.largest(),
            });
        }
        self.weights.insert(unit, weights);
        Ok(())
    }

    /// Administrative update of a single weight
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit` for unregistered units and `WeightOutOfRange`
    /// for mills above the scale.
    pub fn set_weight(
        &mut self,
        unit: UnitId,
        kind: WeightKind,
        mills: u32,
    ) -> Result<(), ConfigurationError> {
        if mills > MILLS_SCALE {
            return Err(ConfigurationError::WeightOutOfRange { unit, mills });
        }
        let entry = self
            .weights
            .get_mut(&unit)
            .ok_or(ConfigurationError::UnknownUnit(unit))?;
        entry.set(kind, mills);
        Ok(())
    }

    /// Returns the mills of a unit for a kind (zero for unknown units)
    pub fn weight_of(&self, unit: UnitId, kind: WeightKind) -> u32 {
        self.weights.get(&unit).map_or(0, |w| w.get(kind))
    }

    /// Sums the mills of all units for a kind
    pub fn total_weight(&self, kind: WeightKind) -> u32 {
        self.weights.values().map(|w| w.get(kind)).sum()
    }

    /// Verifies a kind is usable by a weighted policy
    ///
    /// # Errors
    ///
    /// `NoUnits` for an empty table, `ZeroTotalWeight` when every unit has
    /// zero mills for the kind.
    pub fn require_weights(&self, kind: WeightKind) -> Result<(), ConfigurationError> {
        if self.weights.is_empty() {
            return Err(ConfigurationError::NoUnits);
        }
        if self.total_weight(kind) == 0 {
            return Err(ConfigurationError::ZeroTotalWeight { kind });
        }
        Ok(())
    }

    /// Iterates units in identifier order
    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.weights.keys().copied()
    }

    /// Iterates (unit, mills) pairs for a kind, in identifier order
    pub fn weights_for(&self, kind: WeightKind) -> impl Iterator<Item = (UnitId, u32)> + '_ {
        self.weights.iter().map(move |(u, w)| (*u, w.get(kind)))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
