use crate::types::{Minute, PatientId, Severity};
use serde::{Deserialize, Serialize};

/// One patient, from arrival to (possibly) treatment start.
///
/// Created at arrival, mutated once when treatment begins, and kept in
/// the engine's registry until the run is summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id:                   PatientId,
    pub arrival_time:         Minute,
    pub severity:             Severity,
    /// Minutes of clinician + bed occupation required.
    pub treatment_time:       Minute,
    /// 0 until treatment starts.
    pub wait_time:            Minute,
    pub start_treatment_time: Option<Minute>,
}

impl Patient {
    pub fn new(id: PatientId, arrival_time: Minute, severity: Severity, treatment_time: Minute) -> Self {
        Self {
            id,
            arrival_time,
            severity,
            treatment_time,
            wait_time: 0,
            start_treatment_time: None,
        }
    }

    pub fn is_treated(&self) -> bool {
        self.start_treatment_time.is_some()
    }

    /// Absolute minute the patient releases both resources.
    pub fn treatment_end(&self) -> Option<Minute> {
        self.start_treatment_time.map(|s| s + self.treatment_time)
    }

    /// Record treatment start. Returns the wait time.
    /// `at` must not precede arrival, and a patient starts treatment once.
    pub(crate) fn begin_treatment(&mut self, at: Minute) -> Minute {
        debug_assert!(at >= self.arrival_time, "treatment before arrival");
        debug_assert!(self.start_treatment_time.is_none(), "patient {} treated twice", self.id);
        self.wait_time = at - self.arrival_time;
        self.start_treatment_time = Some(at);
        self.wait_time
    }
}
