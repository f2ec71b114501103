//! Per-agent failures.
//!
//! Every variant here is isolated to the agent that raised it: the scheduler
//! kills that agent, reports the error, and keeps running everyone else.

use thiserror::Error;

use sn_core::{AgentId, NodeId};
use sn_graph::GraphError;
use sn_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum AgentError {
    /// A suspendable step yielded something that is not a wakeup request.
    #[error("invalid yield: expected a wakeup or numeric delay, got {0}")]
    InvalidYield(String),

    /// An FSM agent is in (or moved to) a state with no handler.
    #[error("unknown state `{0}`")]
    UnknownState(String),

    /// A `WhenTrue` predicate failed.
    #[error("condition failed: {0}")]
    Predicate(String),

    /// A wait for a message or a reply expired.
    #[error("timed out: {0}")]
    TimedOut(String),

    /// Wakeup resolution failed (negative delay).
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("topology error: {0}")]
    Graph(#[from] GraphError),

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("node {node} is already occupied by {by}")]
    NodeOccupied { node: NodeId, by: AgentId },

    /// An agent type was declared inconsistently (e.g. duplicate FSM states).
    #[error("invalid agent definition: {0}")]
    Definition(String),

    /// Any other unrecoverable error raised by step logic.
    #[error("step failed: {0}")]
    Failed(String),
}

impl AgentError {
    pub fn failed(msg: impl Into<String>) -> Self {
        AgentError::Failed(msg.into())
    }

    pub fn predicate(msg: impl Into<String>) -> Self {
        AgentError::Predicate(msg.into())
    }

    /// Stable category name used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            AgentError::InvalidYield(_) => "InvalidYield",
            AgentError::UnknownState(_) => "UnknownState",
            AgentError::Predicate(_) => "PredicateError",
            AgentError::TimedOut(_) => "TimedOut",
            AgentError::Schedule(ScheduleError::InvalidDelay(_)) => "InvalidDelay",
            AgentError::Schedule(_) => "ScheduleError",
            AgentError::Graph(_) => "TopologyError",
            AgentError::AgentNotFound(_) => "AgentNotFound",
            AgentError::NodeOccupied { .. } => "NodeOccupied",
            AgentError::Definition(_) => "DefinitionError",
            AgentError::Failed(_) => "StepError",
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
