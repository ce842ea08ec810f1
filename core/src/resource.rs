//! Homogeneous pools of renewable resources (clinicians, beds).
//!
//! RULE: a unit is acquired only through `acquire()`, which refuses to
//! book a unit that is still busy. Every booking is kept for auditing.

use crate::{
    error::{SimError, SimResult},
    types::{Minute, PatientId, UnitIndex},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Clinician,
    Bed,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clinician => f.write_str("clinician"),
            Self::Bed => f.write_str("bed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUnit {
    pub available:  bool,
    /// Absolute minute the unit becomes free. 0 = never used.
    pub busy_until: Minute,
}

impl Default for ResourceUnit {
    fn default() -> Self {
        Self { available: true, busy_until: 0 }
    }
}

/// One acquisition: `unit` is held for `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub unit:    UnitIndex,
    pub patient: PatientId,
    pub start:   Minute,
    pub end:     Minute,
}

#[derive(Debug, Clone)]
pub struct ResourcePool {
    pub kind: PoolKind,
    units:    Vec<ResourceUnit>,
    bookings: Vec<Booking>,
}

impl ResourcePool {
    pub fn new(kind: PoolKind, size: usize) -> Self {
        Self {
            kind,
            units: vec![ResourceUnit::default(); size],
            bookings: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> &[ResourceUnit] {
        &self.units
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// Mark every unit whose `busy_until <= now` available. Idempotent.
    pub fn release(&mut self, now: Minute) {
        for unit in &mut self.units {
            if !unit.available && unit.busy_until <= now {
                unit.available = true;
            }
        }
    }

    /// First unit (lowest index) that is available and free at `at`.
    pub fn find_available(&self, at: Minute) -> Option<UnitIndex> {
        self.units
            .iter()
            .position(|u| u.available && at >= u.busy_until)
    }

    /// Book `unit` for `patient` from `from` until `until`.
    pub fn acquire(
        &mut self,
        unit: UnitIndex,
        patient: PatientId,
        from: Minute,
        until: Minute,
    ) -> SimResult<()> {
        let kind = self.kind;
        let slot = self.units.get_mut(unit).ok_or_else(|| {
            SimError::Other(anyhow::anyhow!("{kind} {unit} does not exist"))
        })?;
        if !slot.available || from < slot.busy_until {
            return Err(SimError::UnitUnavailable {
                pool: kind,
                unit,
                busy_until: slot.busy_until,
                at: from,
            });
        }
        slot.available = false;
        slot.busy_until = until;
        self.bookings.push(Booking { unit, patient, start: from, end: until });
        Ok(())
    }

    /// Earliest `busy_until` strictly after `now`, if any unit is still busy.
    pub fn next_free_after(&self, now: Minute) -> Option<Minute> {
        self.units
            .iter()
            .map(|u| u.busy_until)
            .filter(|&t| t > now)
            .min()
    }

    /// True if any unit was ever booked for two intersecting intervals.
    pub fn has_overlapping_bookings(&self) -> bool {
        let mut by_unit: Vec<Vec<&Booking>> = vec![Vec::new(); self.units.len()];
        for b in &self.bookings {
            by_unit[b.unit].push(b);
        }
        by_unit.iter_mut().any(|list| {
            list.sort_by_key(|b| b.start);
            list.windows(2).any(|w| w[1].start < w[0].end)
        })
    }
}
