//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through a `RandomSource`, and production
//! streams are derived from the single master seed in `SimConfig`.
//!
//! Each concern gets its own stream, seeded from
//! (master_seed XOR slot_index * golden-ratio constant). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Inter-arrival gaps and triage draws are reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::collections::VecDeque;

/// Anything the simulation can draw randomness from.
pub trait RandomSource {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Roll a u64 in [0, n). `n` must be > 0.
    fn next_u64_below(&mut self, n: u64) -> u64;

    /// Roll a u64 in [lo, hi], both ends inclusive.
    fn uniform_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        debug_assert!(lo <= hi, "empty range {lo}..={hi}");
        lo + self.next_u64_below(hi - lo + 1)
    }

    /// Sample an exponential distribution with the given mean.
    fn exponential(&mut self, mean: f64) -> f64 {
        // 1 - u lies in (0, 1], so ln never sees zero.
        let u = 1.0 - self.next_f64();
        -mean * u.ln()
    }
}

/// A named, deterministic RNG for a single stream.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream RNG from the master seed and a stable
    /// slot index. The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RandomSource for StreamRng {
    fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }
}

/// All stream RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> StreamRng {
        StreamRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Arrivals = 0,
    Triage = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Arrivals => "arrivals",
            Self::Triage => "triage",
        }
    }
}

/// Replays a fixed sequence of unit-interval draws.
///
/// `next_u64_below(n)` maps the next draw onto `[0, n)`, so a test can
/// pick an exact outcome with `(k as f64 + 0.5) / n as f64`.
/// Once the sequence is exhausted it keeps returning the last value
/// (or 0.0 if it was empty).
#[derive(Debug, Clone, Default)]
pub struct SequenceRng {
    draws: VecDeque<f64>,
    last:  f64,
}

impl SequenceRng {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            last:  0.0,
        }
    }

    /// Draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for SequenceRng {
    fn next_f64(&mut self) -> f64 {
        if let Some(v) = self.draws.pop_front() {
            self.last = v.clamp(0.0, 1.0 - f64::EPSILON);
        }
        self.last
    }

    fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        ((self.next_f64() * n as f64) as u64).min(n - 1)
    }
}
