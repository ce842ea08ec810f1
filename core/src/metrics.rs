//! Run metrics. Accumulated incrementally by the engine and reduced to a
//! `SimSummary` once the run converges.

use crate::types::Minute;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsAccumulator {
    pub patients_arrived: u64,
    pub patients_treated: u64,
    pub total_wait_time:  Minute,
    pub max_wait_time:    Minute,
    pub clinician_busy:   Minute,
    pub bed_busy:         Minute,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_arrival(&mut self) {
        self.patients_arrived += 1;
    }

    /// One patient paired with a clinician and a bed.
    pub fn record_treatment(&mut self, wait_time: Minute, treatment_time: Minute) {
        self.patients_treated += 1;
        self.total_wait_time += wait_time;
        self.max_wait_time = self.max_wait_time.max(wait_time);
        self.clinician_busy += treatment_time;
        self.bed_busy += treatment_time;
    }

    pub fn summarize(&self, shape: RunShape) -> SimSummary {
        SimSummary {
            total_patients:        self.patients_arrived,
            patients_treated:      self.patients_treated,
            still_waiting:         self.patients_arrived - self.patients_treated,
            average_wait_time:     ratio(self.total_wait_time as f64, self.patients_treated as f64),
            max_wait_time:         self.max_wait_time,
            clinician_utilization: utilization(self.clinician_busy, shape.clinicians, shape.horizon_minutes),
            bed_utilization:       utilization(self.bed_busy, shape.beds, shape.horizon_minutes),
            final_minute:          shape.final_minute,
        }
    }
}

/// Dimensions of a finished run needed to normalize the accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunShape {
    pub clinicians:      usize,
    pub beds:            usize,
    pub horizon_minutes: Minute,
    pub final_minute:    Minute,
}

/// End-of-run record handed to the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSummary {
    pub total_patients:        u64,
    pub patients_treated:      u64,
    /// Arrived but never paired. 0 whenever the run converged.
    pub still_waiting:         u64,
    /// Minutes.
    pub average_wait_time:     f64,
    pub max_wait_time:         Minute,
    /// Busy minutes / (pool size * horizon). Can exceed 1.0 when the
    /// queue drains past the horizon.
    pub clinician_utilization: f64,
    pub bed_utilization:       f64,
    pub final_minute:          Minute,
}

fn utilization(busy: Minute, pool_size: usize, horizon: Minute) -> f64 {
    ratio(busy as f64, pool_size as f64 * horizon as f64)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(clinicians: usize, beds: usize, horizon_minutes: Minute) -> RunShape {
        RunShape { clinicians, beds, horizon_minutes, final_minute: horizon_minutes }
    }

    #[test]
    fn empty_run_reduces_to_zeros() {
        let s = MetricsAccumulator::new().summarize(shape(5, 10, 1440));
        assert_eq!(s.total_patients, 0);
        assert_eq!(s.patients_treated, 0);
        assert_eq!(s.average_wait_time, 0.0);
        assert_eq!(s.clinician_utilization, 0.0);
        assert_eq!(s.bed_utilization, 0.0);
    }

    #[test]
    fn zero_horizon_guards_division() {
        let mut m = MetricsAccumulator::new();
        m.record_arrival();
        m.record_treatment(0, 60);
        let s = m.summarize(shape(1, 1, 0));
        assert_eq!(s.clinician_utilization, 0.0);
        assert_eq!(s.bed_utilization, 0.0);
    }

    #[test]
    fn averages_and_utilization() {
        let mut m = MetricsAccumulator::new();
        for _ in 0..3 {
            m.record_arrival();
        }
        m.record_treatment(0, 50);
        m.record_treatment(50, 70);

        let s = m.summarize(shape(2, 4, 120));
        assert_eq!(s.total_patients, 3);
        assert_eq!(s.patients_treated, 2);
        assert_eq!(s.still_waiting, 1);
        assert_eq!(s.average_wait_time, 25.0);
        assert_eq!(s.max_wait_time, 50);
        assert_eq!(s.clinician_utilization, 120.0 / 240.0);
        assert_eq!(s.bed_utilization, 120.0 / 480.0);
    }
}
