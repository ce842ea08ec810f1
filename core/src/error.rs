use crate::{
    resource::PoolKind,
    types::{Minute, UnitIndex},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("{pool} {unit} is busy until minute {busy_until}, cannot acquire at {at}")]
    UnitUnavailable {
        pool: PoolKind,
        unit: UnitIndex,
        busy_until: Minute,
        at: Minute,
    },

    #[error("Tick limit {limit} exceeded with {waiting} patients still waiting")]
    TickLimitExceeded { limit: u64, waiting: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
