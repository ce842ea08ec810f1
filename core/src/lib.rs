//! Discrete-event simulation of emergency-department intake.
//!
//! Patients arrive stochastically, wait in a severity-ordered queue, and
//! are treated once a clinician and a bed are both free. One run per
//! `SimEngine`; the result is a `SimSummary`.

pub mod arrivals;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;
pub mod patient;
pub mod queue;
pub mod resource;
pub mod rng;
pub mod types;

pub use config::SimConfig;
pub use engine::SimEngine;
pub use error::{SimError, SimResult};
pub use metrics::SimSummary;
