//! Everything that happens during a run, in order.
//!
//! The engine appends each tick's events to an in-memory log. Two runs
//! with the same seed must produce identical logs.

use crate::types::{Minute, PatientId, Severity, UnitIndex};
use serde::{Deserialize, Serialize};

/// Variants are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        seed:            u64,
        horizon_minutes: Minute,
        clinicians:      usize,
        beds:            usize,
    },
    HorizonReached {
        minute:  Minute,
        waiting: usize,
    },
    RunCompleted {
        minute: Minute,
        ticks:  u64,
    },

    // ── Patient flow ───────────────────────────────
    PatientArrived {
        minute:         Minute,
        patient_id:     PatientId,
        severity:       Severity,
        treatment_time: Minute,
    },
    TreatmentStarted {
        minute:     Minute,
        patient_id: PatientId,
        clinician:  UnitIndex,
        bed:        UnitIndex,
        wait_time:  Minute,
        until:      Minute,
    },
}

impl SimEvent {
    /// Stable snake_case name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }   => "run_initialized",
            Self::HorizonReached { .. }   => "horizon_reached",
            Self::RunCompleted { .. }     => "run_completed",
            Self::PatientArrived { .. }   => "patient_arrived",
            Self::TreatmentStarted { .. } => "treatment_started",
        }
    }
}
