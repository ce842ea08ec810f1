use crate::{
    error::{SimError, SimResult},
    types::Minute,
};
use serde::{Deserialize, Serialize};

/// Highest shaped arrival rate (per hour) a run may reach.
///
/// Inter-arrival gaps are floored to whole minutes, so at very high rates
/// almost every gap is 0 and arrival generation never leaves the current
/// minute. At 120/h the mean gap is 30 seconds.
pub const MAX_SHAPED_ARRIVAL_RATE: f64 = 120.0;

/// Time-of-day shaping applied to the base hourly arrival rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalProfile {
    /// Hours 0..=6.
    pub night_multiplier:   f64,
    /// Every hour not covered by night or evening.
    pub day_multiplier:     f64,
    /// Hours 18..=22.
    pub evening_multiplier: f64,
}

impl ArrivalProfile {
    /// Largest of the three multipliers.
    pub fn peak_multiplier(&self) -> f64 {
        self.night_multiplier
            .max(self.day_multiplier)
            .max(self.evening_multiplier)
    }
}

impl Default for ArrivalProfile {
    fn default() -> Self {
        Self {
            night_multiplier:   2.0,
            day_multiplier:     5.0,
            evening_multiplier: 8.0,
        }
    }
}

/// Fixed in-memory configuration for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Last minute (exclusive) at which new arrivals are admitted.
    pub horizon_minutes:   Minute,
    pub clinicians:        usize,
    pub beds:              usize,
    /// Arrivals per hour before time-of-day shaping.
    pub base_arrival_rate: f64,
    pub seed:              u64,
    pub arrival_profile:   ArrivalProfile,
    /// Optional hard cap on loop iterations. `None` = unbounded.
    pub max_ticks:         Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon_minutes:   1440, // 24 hours
            clinicians:        5,
            beds:              10,
            base_arrival_rate: 5.0,
            seed:              42,
            arrival_profile:   ArrivalProfile::default(),
            max_ticks:         None,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. Missing fields fall back to `Default`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Small, light-load config for unit tests: 8 hours, flat rate.
    pub fn default_test() -> Self {
        Self {
            horizon_minutes:   480,
            clinicians:        2,
            beds:              3,
            base_arrival_rate: 1.0,
            seed:              7,
            arrival_profile:   ArrivalProfile {
                night_multiplier:   1.0,
                day_multiplier:     1.0,
                evening_multiplier: 1.0,
            },
            max_ticks:         Some(100_000),
        }
    }

    /// Reject configurations the engine cannot converge on.
    ///
    /// An empty pool would leave every arrival waiting forever, so it is
    /// refused here instead of looping. A zero rate or zero horizon is fine:
    /// the run is simply empty.
    pub fn validate(&self) -> SimResult<()> {
        if self.clinicians == 0 {
            return Err(invalid("clinicians", "must be at least 1"));
        }
        if self.beds == 0 {
            return Err(invalid("beds", "must be at least 1"));
        }
        if !self.base_arrival_rate.is_finite() || self.base_arrival_rate < 0.0 {
            return Err(invalid(
                "base_arrival_rate",
                &format!("must be finite and >= 0, got {}", self.base_arrival_rate),
            ));
        }
        let profile = &self.arrival_profile;
        for (field, value) in [
            ("arrival_profile.night_multiplier", profile.night_multiplier),
            ("arrival_profile.day_multiplier", profile.day_multiplier),
            ("arrival_profile.evening_multiplier", profile.evening_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, &format!("must be finite and > 0, got {value}")));
            }
        }
        let peak_rate = self.base_arrival_rate * profile.peak_multiplier();
        if peak_rate > MAX_SHAPED_ARRIVAL_RATE {
            return Err(invalid(
                "base_arrival_rate",
                &format!(
                    "shaped peak rate {peak_rate:.1}/h exceeds {MAX_SHAPED_ARRIVAL_RATE}/h"
                ),
            ));
        }
        if self.max_ticks == Some(0) {
            return Err(invalid("max_ticks", "must be > 0 when set"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> SimError {
    SimError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}
