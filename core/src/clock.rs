//! Simulation clock: owns the current minute and the arrival horizon.
//!
//! The clock steps one minute per tick. The next decision time only caps
//! that step: it is the earliest of the horizon, the head of the waiting
//! queue and every unit's `busy_until`, counted only when they lie in the
//! future, so it is never closer than one minute away.

use crate::{resource::ResourcePool, types::Minute};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current: Minute,
    pub horizon: Minute,
}

impl SimClock {
    pub fn new(horizon: Minute) -> Self {
        Self { current: 0, horizon }
    }

    pub fn past_horizon(&self) -> bool {
        self.current >= self.horizon
    }

    /// Earliest relevant event strictly after `current`, or `current + 1`
    /// when nothing is pending.
    pub fn next_decision_time(&self, head_arrival: Option<Minute>, pools: &[&ResourcePool]) -> Minute {
        let now = self.current;
        let horizon = Some(self.horizon).filter(|&h| h > now);
        let head = head_arrival.filter(|&t| t > now);

        pools
            .iter()
            .filter_map(|p| p.next_free_after(now))
            .chain(horizon)
            .chain(head)
            .min()
            .unwrap_or(now + 1)
    }

    /// Step to `min(current + 1, next_decision)`, which is always
    /// `current + 1` for a decision time from `next_decision_time`.
    /// Returns the new minute.
    pub fn advance(&mut self, next_decision: Minute) -> Minute {
        debug_assert!(next_decision > self.current, "clock must move forward");
        self.current = (self.current + 1).min(next_decision);
        self.current
    }
}
