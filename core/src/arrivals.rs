//! Patient arrival generation.
//!
//! Arrivals follow a Poisson process whose hourly rate is the configured
//! base rate shaped by the hour of day (quiet nights, busy evenings).
//! Each arrival draws a severity and a treatment duration from the
//! triage stream, so the arrival timeline and the case mix can be
//! replayed independently.

use crate::{
    config::{ArrivalProfile, SimConfig},
    rng::{RandomSource, RngBank, StreamRng, StreamSlot},
    types::{Minute, Severity, MAX_SEVERITY, MIN_SEVERITY},
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Upper bound of every treatment duration, in minutes.
pub const MAX_TREATMENT_MINUTES: Minute = 120;
/// Treatment lower bound is this plus 10 minutes per severity level.
pub const BASE_TREATMENT_MINUTES: Minute = 30;

/// A patient about to walk in. The engine assigns the id on admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrival {
    pub arrival_time:   Minute,
    pub severity:       Severity,
    pub treatment_time: Minute,
}

impl ArrivalProfile {
    /// Rate multiplier for an hour of the day (0..=23).
    pub fn multiplier(&self, hour: u64) -> f64 {
        match hour {
            0..=6 => self.night_multiplier,
            18..=22 => self.evening_multiplier,
            _ => self.day_multiplier,
        }
    }
}

/// Hour of the day for an absolute minute. Wraps after 24 hours.
pub fn hour_of_day(minute: Minute) -> u64 {
    (minute / 60) % 24
}

/// Shaped arrivals per hour at `minute`.
pub fn rate_at(base_rate: f64, profile: &ArrivalProfile, minute: Minute) -> f64 {
    base_rate * profile.multiplier(hour_of_day(minute))
}

/// Whole minutes until the next arrival, or `None` if the rate is zero.
/// Mean gap is `60 / rate_per_hour` minutes.
pub fn draw_interarrival(rng: &mut impl RandomSource, rate_per_hour: f64) -> Option<Minute> {
    if rate_per_hour <= 0.0 {
        return None;
    }
    let gap = rng.exponential(60.0 / rate_per_hour);
    Some(gap.floor() as Minute)
}

/// Severity skewed toward urgent cases:
/// roll 1..=10 → 7+ is 5, 5-6 is 4, 3-4 is 3, 2 is 2, 1 is 1.
pub fn draw_severity(rng: &mut impl RandomSource) -> Severity {
    let roll = rng.uniform_inclusive(1, 10);
    if roll >= 7 {
        5
    } else if roll >= 5 {
        4
    } else if roll >= 3 {
        3
    } else if roll >= 2 {
        2
    } else {
        1
    }
}

/// Uniform in `[30 + severity * 10, 120]`.
pub fn draw_treatment_time(rng: &mut impl RandomSource, severity: Severity) -> Minute {
    let severity = severity.clamp(MIN_SEVERITY, MAX_SEVERITY) as Minute;
    rng.uniform_inclusive(BASE_TREATMENT_MINUTES + severity * 10, MAX_TREATMENT_MINUTES)
}

/// A source of arrivals for the engine.
pub trait ArrivalProcess {
    /// Every pending arrival with `arrival_time <= now` and
    /// `arrival_time < horizon`, in arrival order.
    /// Arrivals at or past the horizon are never returned.
    fn due(&mut self, now: Minute, horizon: Minute) -> Vec<Arrival>;
}

/// The stochastic generator used for real runs.
pub struct PoissonArrivals<R: RandomSource> {
    base_rate:    f64,
    profile:      ArrivalProfile,
    next_arrival: Option<Minute>,
    gaps:         R,
    triage:       R,
}

impl PoissonArrivals<StreamRng> {
    /// Wire both streams from the run's master seed.
    pub fn from_config(config: &SimConfig) -> Self {
        let bank = RngBank::new(config.seed);
        Self::new(
            config.base_arrival_rate,
            config.arrival_profile.clone(),
            bank.for_stream(StreamSlot::Arrivals),
            bank.for_stream(StreamSlot::Triage),
        )
    }
}

impl<R: RandomSource> PoissonArrivals<R> {
    /// `gaps` drives inter-arrival times, `triage` drives severity and
    /// treatment time. The first arrival is scheduled from minute 0 at the
    /// unshaped base rate; shaping applies from the first tick on.
    pub fn new(base_rate: f64, profile: ArrivalProfile, mut gaps: R, triage: R) -> Self {
        let next_arrival = draw_interarrival(&mut gaps, base_rate);
        Self {
            base_rate,
            profile,
            next_arrival,
            gaps,
            triage,
        }
    }

    /// Scheduled time of the next arrival, if any.
    pub fn next_arrival(&self) -> Option<Minute> {
        self.next_arrival
    }
}

impl<R: RandomSource> ArrivalProcess for PoissonArrivals<R> {
    fn due(&mut self, now: Minute, horizon: Minute) -> Vec<Arrival> {
        // Gaps scheduled during this call use the rate in force at `now`.
        let rate = rate_at(self.base_rate, &self.profile, now);
        let mut admitted = Vec::new();

        while let Some(at) = self.next_arrival {
            if at > now || at >= horizon {
                break;
            }
            let severity = draw_severity(&mut self.triage);
            let treatment_time = draw_treatment_time(&mut self.triage, severity);
            admitted.push(Arrival {
                arrival_time: at,
                severity,
                treatment_time,
            });
            self.next_arrival = draw_interarrival(&mut self.gaps, rate).map(|gap| at + gap);
        }
        admitted
    }
}

/// A fixed timeline of arrivals, for scenarios and replays.
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    pending: VecDeque<Arrival>,
}

impl ScriptedArrivals {
    pub fn new(arrivals: impl IntoIterator<Item = Arrival>) -> Self {
        let mut list: Vec<Arrival> = arrivals.into_iter().collect();
        // stable: same-minute arrivals keep their listed order
        list.sort_by_key(|a| a.arrival_time);
        Self { pending: list.into() }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ArrivalProcess for ScriptedArrivals {
    fn due(&mut self, now: Minute, horizon: Minute) -> Vec<Arrival> {
        let mut admitted = Vec::new();
        while let Some(next) = self.pending.front() {
            if next.arrival_time > now || next.arrival_time >= horizon {
                break;
            }
            admitted.extend(self.pending.pop_front());
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceRng;

    /// Unit-interval draw that makes `uniform_inclusive(lo, hi)` return `pick`.
    fn pick(pick: u64, lo: u64, hi: u64) -> f64 {
        ((pick - lo) as f64 + 0.5) / (hi - lo + 1) as f64
    }

    #[test]
    fn profile_maps_hours_to_multipliers() {
        let p = ArrivalProfile::default();
        assert_eq!(p.multiplier(0), 2.0);
        assert_eq!(p.multiplier(6), 2.0);
        assert_eq!(p.multiplier(7), 5.0);
        assert_eq!(p.multiplier(17), 5.0);
        assert_eq!(p.multiplier(18), 8.0);
        assert_eq!(p.multiplier(22), 8.0);
        assert_eq!(p.multiplier(23), 5.0);
    }

    #[test]
    fn rate_wraps_after_a_day() {
        let p = ArrivalProfile::default();
        assert_eq!(hour_of_day(19 * 60), 19);
        assert_eq!(rate_at(5.0, &p, 19 * 60), 40.0);
        assert_eq!(rate_at(5.0, &p, 24 * 60 + 30), 10.0);
    }

    #[test]
    fn severity_follows_roll_thresholds() {
        let expected = [(1, 1), (2, 2), (3, 3), (4, 3), (5, 4), (6, 4), (7, 5), (10, 5)];
        for (roll, severity) in expected {
            let mut rng = SequenceRng::new([pick(roll, 1, 10)]);
            assert_eq!(draw_severity(&mut rng), severity, "roll {roll}");
        }
    }

    #[test]
    fn treatment_time_stays_in_severity_band() {
        let mut rng = RngBank::new(3).for_stream(StreamSlot::Triage);
        for severity in MIN_SEVERITY..=MAX_SEVERITY {
            let lo = BASE_TREATMENT_MINUTES + severity as Minute * 10;
            for _ in 0..200 {
                let t = draw_treatment_time(&mut rng, severity);
                assert!((lo..=MAX_TREATMENT_MINUTES).contains(&t), "sev {severity} drew {t}");
            }
        }
    }

    #[test]
    fn zero_rate_schedules_nothing() {
        let mut rng = SequenceRng::new([0.5]);
        assert_eq!(draw_interarrival(&mut rng, 0.0), None);

        let mut arrivals = PoissonArrivals::new(
            0.0,
            ArrivalProfile::default(),
            SequenceRng::new([0.5]),
            SequenceRng::new([0.5]),
        );
        assert_eq!(arrivals.next_arrival(), None);
        assert!(arrivals.due(10_000, 20_000).is_empty());
    }

    #[test]
    fn first_arrival_uses_the_unshaped_base_rate() {
        // u = 0.5 gives a gap of mean * ln 2. Base 6/h → mean 10 min → 6.93,
        // whereas the night-shaped 12/h would give 3.47.
        let arrivals = PoissonArrivals::new(
            6.0,
            ArrivalProfile::default(),
            SequenceRng::new([0.5]),
            SequenceRng::new([0.5]),
        );
        assert_eq!(arrivals.next_arrival(), Some(6));
    }

    #[test]
    fn poisson_arrivals_respect_now_and_horizon() {
        let config = SimConfig { base_arrival_rate: 6.0, ..SimConfig::default() };
        let mut arrivals = PoissonArrivals::from_config(&config);

        let mut all = Vec::new();
        for now in 0..600 {
            for a in arrivals.due(now, 300) {
                assert!(a.arrival_time <= now);
                assert!(a.arrival_time < 300);
                all.push(a);
            }
        }
        assert!(!all.is_empty());
        assert!(all.windows(2).all(|w| w[0].arrival_time <= w[1].arrival_time));
        // the generator stops at the first arrival past the horizon
        assert!(arrivals.next_arrival().is_some_and(|t| t >= 300));
    }

    #[test]
    fn scripted_arrivals_release_in_time_order() {
        let a = |t, s| Arrival { arrival_time: t, severity: s, treatment_time: 60 };
        let mut script = ScriptedArrivals::new([a(20, 1), a(0, 5), a(0, 3), a(500, 2)]);

        let first = script.due(0, 480);
        assert_eq!(first, vec![a(0, 5), a(0, 3)]);
        assert!(script.due(19, 480).is_empty());
        assert_eq!(script.due(100, 480), vec![a(20, 1)]);
        // minute 500 is past the horizon
        assert!(script.due(1000, 480).is_empty());
        assert_eq!(script.remaining(), 1);
    }
}
