//! Meter readings and consumption statements
//!
//! Readings are cumulative counter values. For a fixed (unit, kind) the value
//! is non-decreasing over time; consumption over a range is end minus start
//! and therefore never negative. Violations are rejected at ingestion with a
//! `DataIntegrityError` rather than silently clamped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use core_kernel::{DateRange, MeterReadingId, UnitId};

use crate::error::DataIntegrityError;

/// What a meter measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    Water,
    Electricity,
    HeatingHours,
    HeatingEnergy,
}

impl MeterKind {
    /// Heating kinds get the fixed/variable split; other kinds distribute
    /// purely by consumption
    pub fn is_heating(&self) -> bool {
        matches!(self, MeterKind::HeatingHours | MeterKind::HeatingEnergy)
    }
}

impl fmt::Display for MeterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeterKind::Water => "water",
            MeterKind::Electricity => "electricity",
            MeterKind::HeatingHours => "heating-hours",
            MeterKind::HeatingEnergy => "heating-energy",
        };
        write!(f, "{}", name)
    }
}

/// One cumulative meter observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReading {
    pub id: MeterReadingId,
    pub unit_id: UnitId,
    pub kind: MeterKind,
    pub recorded_at: DateTime<Utc>,
    /// Cumulative counter value
    pub value: Decimal,
}

impl MeterReading {
    pub fn new(unit_id: UnitId, kind: MeterKind, recorded_at: DateTime<Utc>, value: Decimal) -> Self {
        Self {
            id: MeterReadingId::new_v7(),
            unit_id,
            kind,
            recorded_at,
            value,
        }
    }
}

/// Validated reading history per (unit, meter kind)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeterLog {
    series: BTreeMap<(UnitId, MeterKind), Vec<MeterReading>>,
}

impl MeterLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests a reading, enforcing the non-decreasing invariant
    ///
    /// # Errors
    ///
    /// - `NegativeReading` for a counter value below zero
    /// - `OutOfOrderReading` when timestamped before the latest reading
    /// - `NonMonotonicReading` when the counter value decreased
    pub fn record(&mut self, reading: MeterReading) -> Result<(), DataIntegrityError> {
        if reading.value.is_sign_negative() {
            return Err(DataIntegrityError::NegativeReading {
                unit: reading.unit_id,
                kind: reading.kind,
                value: reading.value,
            });
        }

        let series = self
            .series
            .entry((reading.unit_id, reading.kind))
            .or_default();

        if let Some(last) = series.last() {
            if reading.recorded_at < last.recorded_at {
                return Err(DataIntegrityError::OutOfOrderReading {
                    unit: reading.unit_id,
                    kind: reading.kind,
                });
            }
            if reading.value < last.value {
                return Err(DataIntegrityError::NonMonotonicReading {
                    unit: reading.unit_id,
                    kind: reading.kind,
                    previous: last.value,
                    value: reading.value,
                });
            }
        }

        series.push(reading);
        Ok(())
    }

    /// Consumption of a unit over a date range: end value minus start value
    ///
    /// The start value is the latest reading on or before the range start
    /// (falling back to the first in-range reading); the end value is the
    /// latest reading inside the range. Fewer than two usable readings mean
    /// zero consumption.
    pub fn consumption(&self, unit: UnitId, kind: MeterKind, range: DateRange) -> Decimal {
        let Some(series) = self.series.get(&(unit, kind)) else {
            return Decimal::ZERO;
        };

        let start_value = series
            .iter()
            .rev()
            .find(|r| r.recorded_at.date_naive() <= range.start)
            .or_else(|| {
                series
                    .iter()
                    .find(|r| range.contains(r.recorded_at.date_naive()))
            })
            .map(|r| r.value);

        let end_value = series
            .iter()
            .rev()
            .find(|r| r.recorded_at.date_naive() <= range.end)
            .map(|r| r.value);

        match (start_value, end_value) {
            (Some(start), Some(end)) if end > start => end - start,
            _ => Decimal::ZERO,
        }
    }

    /// Builds a per-unit consumption statement for a range
    pub fn statement(
        &self,
        units: impl IntoIterator<Item = UnitId>,
        kind: MeterKind,
        range: DateRange,
    ) -> Result<ConsumptionStatement, DataIntegrityError> {
        let mut statement = ConsumptionStatement::new(kind, range);
        for unit in units {
            statement.set_usage(unit, self.consumption(unit, kind, range))?;
        }
        Ok(statement)
    }

    /// Readings recorded for one (unit, kind), oldest first
    pub fn readings(&self, unit: UnitId, kind: MeterKind) -> &[MeterReading] {
        self.series
            .get(&(unit, kind))
            .map_or(&[], |s| s.as_slice())
    }
}

/// Per-unit consumption over one metering period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionStatement {
    kind: MeterKind,
    period: DateRange,
    usage: BTreeMap<UnitId, Decimal>,
}

impl ConsumptionStatement {
    pub fn new(kind: MeterKind, period: DateRange) -> Self {
        Self {
            kind,
            period,
            usage: BTreeMap::new(),
        }
    }

    /// Records a unit's consumption
    ///
    /// # Errors
    ///
    /// Returns `NegativeConsumption` for a delta below zero.
    pub fn set_usage(&mut self, unit: UnitId, delta: Decimal) -> Result<(), DataIntegrityError> {
        if delta.is_sign_negative() {
            return Err(DataIntegrityError::NegativeConsumption { unit, delta });
        }
        self.usage.insert(unit, delta);
        Ok(())
    }

    pub fn kind(&self) -> MeterKind {
        self.kind
    }

    pub fn period(&self) -> DateRange {
        self.period
    }

    /// A unit's consumption (zero when absent)
    pub fn usage_of(&self, unit: UnitId) -> Decimal {
        self.usage.get(&unit).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum over all units
    pub fn total_usage(&self) -> Decimal {
        self.usage.values().sum()
    }

    /// Iterates (unit, delta) pairs in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, Decimal)> + '_ {
        self.usage.iter().map(|(u, d)| (*u, *d))
    }
}
