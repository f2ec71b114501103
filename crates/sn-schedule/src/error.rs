use thiserror::Error;

use sn_core::{AgentId, SimTime};

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("invalid delay {0}: delays must be non-negative")]
    InvalidDelay(f64),

    #[error("{agent} is already scheduled at {at}")]
    AlreadyScheduled { agent: AgentId, at: SimTime },

    #[error("{0} is already waiting on a condition")]
    AlreadyPending(AgentId),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
