//! The simulation engine: the emergency-department intake loop.
//!
//! EXECUTION ORDER per tick (fixed, never reordered):
//!   1. Refresh resource availability at the current minute.
//!   2. Admit every arrival due at or before the current minute.
//!   3. Compute the next decision time.
//!   4. Attempt ONE allocation for the head of the waiting queue.
//!   5. Advance the clock.
//!
//! Admitting before allocating is what makes a patient arriving this
//! minute visible to the allocator this minute.
//!
//! RULES:
//!   - Only the queue head is ever considered, once per tick. A head that
//!     cannot get both a clinician and a bed blocks everyone behind it
//!     until the next tick.
//!   - A clinician is never reserved without a bed (or vice versa).
//!   - All randomness lives inside the arrival process.
//!   - The run ends once the horizon has passed AND the queue is empty.

use crate::{
    arrivals::{Arrival, ArrivalProcess, PoissonArrivals},
    clock::SimClock,
    config::SimConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    metrics::{MetricsAccumulator, RunShape, SimSummary},
    patient::Patient,
    queue::WaitingQueue,
    resource::{PoolKind, ResourcePool},
    rng::StreamRng,
    types::PatientId,
};

pub struct SimEngine<A: ArrivalProcess = PoissonArrivals<StreamRng>> {
    pub config:        SimConfig,
    pub clock:         SimClock,
    clinicians:        ResourcePool,
    beds:              ResourcePool,
    queue:             WaitingQueue,
    /// Every admitted patient; `patients[id - 1]`.
    patients:          Vec<Patient>,
    metrics:           MetricsAccumulator,
    arrivals:          A,
    event_log:         Vec<SimEvent>,
    ticks:             u64,
    horizon_announced: bool,
    completed:         bool,
}

impl SimEngine<PoissonArrivals<StreamRng>> {
    /// Build a fully wired engine with stochastic arrivals seeded from
    /// `config.seed`.
    pub fn build(config: SimConfig) -> SimResult<Self> {
        let arrivals = PoissonArrivals::from_config(&config);
        Self::with_arrivals(config, arrivals)
    }
}

impl<A: ArrivalProcess> SimEngine<A> {
    /// Validate `config` and wire an engine around any arrival process.
    pub fn with_arrivals(config: SimConfig, arrivals: A) -> SimResult<Self> {
        config.validate()?;

        log::info!(
            "run init: seed={} horizon={}min clinicians={} beds={} base_rate={:.2}/h",
            config.seed,
            config.horizon_minutes,
            config.clinicians,
            config.beds,
            config.base_arrival_rate
        );

        let event_log = vec![SimEvent::RunInitialized {
            seed:            config.seed,
            horizon_minutes: config.horizon_minutes,
            clinicians:      config.clinicians,
            beds:            config.beds,
        }];

        Ok(Self {
            clock:             SimClock::new(config.horizon_minutes),
            clinicians:        ResourcePool::new(PoolKind::Clinician, config.clinicians),
            beds:              ResourcePool::new(PoolKind::Bed, config.beds),
            queue:             WaitingQueue::new(),
            patients:          Vec::new(),
            metrics:           MetricsAccumulator::new(),
            arrivals,
            event_log,
            ticks:             0,
            horizon_announced: false,
            completed:         false,
            config,
        })
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        let now = self.clock.current;
        let mut tick_events = Vec::new();

        self.clinicians.release(now);
        self.beds.release(now);

        for arrival in self.arrivals.due(now, self.clock.horizon) {
            tick_events.push(self.admit(arrival));
        }

        let head_arrival = self.queue.peek().map(|k| k.arrival_time);
        let next_decision = self
            .clock
            .next_decision_time(head_arrival, &[&self.clinicians, &self.beds]);

        if let Some(event) = self.try_allocate()? {
            tick_events.push(event);
        }

        self.clock.advance(next_decision);
        self.ticks += 1;

        if !self.horizon_announced && self.clock.past_horizon() {
            self.horizon_announced = true;
            let waiting = self.queue.len();
            if waiting > 0 {
                log::warn!(
                    "minute={} horizon reached with {waiting} patients still waiting",
                    self.clock.current
                );
            }
            tick_events.push(SimEvent::HorizonReached {
                minute: self.clock.current,
                waiting,
            });
        }

        log::trace!(
            "tick={} minute={now} next_decision={next_decision} waiting={}",
            self.ticks,
            self.queue.len()
        );

        self.event_log.extend(tick_events.iter().cloned());
        Ok(tick_events)
    }

    /// Try to pair the queue head with one clinician and one bed.
    ///
    /// Returns `None` when the queue is empty or either pool has no unit
    /// free at `max(now, head.arrival_time)`. Nothing is reserved then.
    pub fn try_allocate(&mut self) -> SimResult<Option<SimEvent>> {
        let Some(head) = self.queue.peek() else {
            return Ok(None);
        };
        let assign_time = self.clock.current.max(head.arrival_time);

        let Some(clinician) = self.clinicians.find_available(assign_time) else {
            return Ok(None);
        };
        let Some(bed) = self.beds.find_available(assign_time) else {
            return Ok(None);
        };

        let patient = self
            .patients
            .get_mut(registry_index(head.id))
            .ok_or_else(|| anyhow::anyhow!("queued patient {} missing from registry", head.id))?;
        let until = assign_time + patient.treatment_time;

        self.clinicians.acquire(clinician, patient.id, assign_time, until)?;
        self.beds.acquire(bed, patient.id, assign_time, until)?;
        let wait_time = patient.begin_treatment(assign_time);
        self.metrics.record_treatment(wait_time, patient.treatment_time);
        self.queue.pop();

        log::debug!(
            "minute={assign_time} patient={} sev={} clinician={clinician} bed={bed} wait={wait_time} until={until}",
            patient.id,
            patient.severity
        );

        Ok(Some(SimEvent::TreatmentStarted {
            minute: assign_time,
            patient_id: patient.id,
            clinician,
            bed,
            wait_time,
            until,
        }))
    }

    /// Horizon passed and nobody left waiting.
    pub fn is_finished(&self) -> bool {
        self.clock.past_horizon() && self.queue.is_empty()
    }

    /// Tick until the run converges, then summarize.
    ///
    /// Fails with `TickLimitExceeded` if `config.max_ticks` is set and the
    /// queue has not drained by then.
    pub fn run(&mut self) -> SimResult<SimSummary> {
        while !self.is_finished() {
            if let Some(limit) = self.config.max_ticks {
                if self.ticks >= limit {
                    return Err(SimError::TickLimitExceeded {
                        limit,
                        waiting: self.queue.len(),
                    });
                }
            }
            self.tick()?;
        }

        let summary = self.summary();
        if !self.completed {
            self.completed = true;
            self.event_log.push(SimEvent::RunCompleted {
                minute: self.clock.current,
                ticks:  self.ticks,
            });
            log::info!(
                "run complete: minute={} ticks={} arrived={} treated={} avg_wait={:.2}",
                self.clock.current,
                self.ticks,
                summary.total_patients,
                summary.patients_treated,
                summary.average_wait_time
            );
        }
        Ok(summary)
    }

    /// Reduce the accumulators as of now. Safe to call mid-run.
    pub fn summary(&self) -> SimSummary {
        self.metrics.summarize(RunShape {
            clinicians:      self.clinicians.size(),
            beds:            self.beds.size(),
            horizon_minutes: self.config.horizon_minutes,
            final_minute:    self.clock.current,
        })
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(registry_index(id))
    }

    /// Patients still waiting, in service order.
    pub fn waiting_patients(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.queue
            .iter_ordered()
            .filter_map(move |k| self.patient(k.id))
    }

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn clinicians(&self) -> &ResourcePool {
        &self.clinicians
    }

    pub fn beds(&self) -> &ResourcePool {
        &self.beds
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    pub fn event_log(&self) -> &[SimEvent] {
        &self.event_log
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn admit(&mut self, arrival: Arrival) -> SimEvent {
        let id = self.patients.len() as PatientId + 1;
        let patient = Patient::new(id, arrival.arrival_time, arrival.severity, arrival.treatment_time);
        self.queue.push(&patient);
        self.patients.push(patient);
        self.metrics.record_arrival();

        SimEvent::PatientArrived {
            minute:         arrival.arrival_time,
            patient_id:     id,
            severity:       arrival.severity,
            treatment_time: arrival.treatment_time,
        }
    }
}

fn registry_index(id: PatientId) -> usize {
    (id as usize).wrapping_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrivals::ScriptedArrivals;

    fn arrival(at: u64, severity: u8, treatment_time: u64) -> Arrival {
        Arrival { arrival_time: at, severity, treatment_time }
    }

    fn engine(clinicians: usize, beds: usize, script: Vec<Arrival>) -> SimEngine<ScriptedArrivals> {
        let config = SimConfig { clinicians, beds, horizon_minutes: 120, ..SimConfig::default_test() };
        SimEngine::with_arrivals(config, ScriptedArrivals::new(script)).unwrap()
    }

    #[test]
    fn arrival_is_visible_to_allocator_in_the_same_tick() {
        let mut e = engine(1, 1, vec![arrival(0, 2, 40)]);
        let events = e.tick().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SimEvent::PatientArrived { patient_id: 1, .. }));
        assert!(matches!(
            events[1],
            SimEvent::TreatmentStarted { minute: 0, patient_id: 1, wait_time: 0, until: 40, .. }
        ));
        assert_eq!(e.clock.current, 1);
    }

    #[test]
    fn clinician_is_not_held_while_waiting_for_a_bed() {
        let mut e = engine(2, 1, vec![arrival(0, 5, 60), arrival(0, 4, 60)]);
        e.tick().unwrap();
        // second patient is blocked on the single bed
        assert!(e.try_allocate().unwrap().is_none());
        let held = e.clinicians().units().iter().filter(|u| !u.available).count();
        assert_eq!(held, 1);
        assert_eq!(e.queue().len(), 1);
    }

    #[test]
    fn only_the_head_is_tried_each_tick() {
        let mut e = engine(3, 3, vec![arrival(0, 5, 30), arrival(0, 3, 30), arrival(0, 1, 30)]);
        let events = e.tick().unwrap();
        let started = events
            .iter()
            .filter(|ev| matches!(ev, SimEvent::TreatmentStarted { .. }))
            .count();
        assert_eq!(started, 1);
        assert_eq!(e.queue().len(), 2);

        e.tick().unwrap();
        assert_eq!(e.patient(2).and_then(|p| p.start_treatment_time), Some(1));
        e.tick().unwrap();
        assert_eq!(e.patient(3).and_then(|p| p.start_treatment_time), Some(2));
    }

    #[test]
    fn waiting_patients_are_listed_in_service_order() {
        let mut e = engine(1, 1, vec![arrival(0, 1, 100), arrival(0, 2, 30), arrival(0, 5, 30)]);
        e.tick().unwrap();
        let waiting: Vec<PatientId> = e.waiting_patients().map(|p| p.id).collect();
        assert_eq!(waiting, vec![2, 1]);
    }

    #[test]
    fn horizon_event_is_emitted_once() {
        let mut e = engine(1, 1, vec![]);
        e.run().unwrap();
        let horizons = e
            .event_log()
            .iter()
            .filter(|ev| matches!(ev, SimEvent::HorizonReached { .. }))
            .count();
        assert_eq!(horizons, 1);
        assert_eq!(e.event_log().last().map(|ev| ev.event_type()), Some("run_completed"));
    }
}
