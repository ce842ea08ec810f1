//! Shared primitive types used across the entire simulation.

/// An absolute simulation minute. Minute 0 is the start of the run.
pub type Minute = u64;

/// A stable, monotonically increasing patient identifier (first patient = 1).
pub type PatientId = u64;

/// Position of a unit inside its resource pool.
pub type UnitIndex = usize;

/// Triage severity. Higher = more urgent.
pub type Severity = u8;

pub const MIN_SEVERITY: Severity = 1;
pub const MAX_SEVERITY: Severity = 5;
