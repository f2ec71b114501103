//! Per-agent scheduling bookkeeping, private to the scheduler.

use std::fmt;

use sn_agent::{Agent, AgentError};
use sn_core::{AgentId, AgentRng, SimTime};

/// Scheduling state of one agent.
///
/// Invariants kept by [`Scheduler`](crate::Scheduler):
///
/// - alive and timed: in exactly one wake-queue bucket, at `next_wakeup`;
/// - alive and waiting on a condition: in the pending set, `next_wakeup` is
///   `NEVER`;
/// - dead: in neither, `next_wakeup` is `NEVER`, and the behavior is dropped.
pub struct AgentRuntime {
    pub id:          AgentId,
    pub alive:       bool,
    pub next_wakeup: SimTime,
    /// Taken out for the duration of an activation.
    pub(crate) behavior: Option<Box<dyn Agent>>,
    pub(crate) rng:      AgentRng,
}

impl AgentRuntime {
    pub(crate) fn new(id: AgentId, behavior: Box<dyn Agent>, trial_seed: u64) -> Self {
        AgentRuntime {
            id,
            alive: true,
            next_wakeup: SimTime::NEVER,
            behavior: Some(behavior),
            rng: AgentRng::new(trial_seed, id),
        }
    }

    /// `true` while the agent holds a live resumable cursor.
    pub fn is_suspended(&self) -> bool {
        self.behavior.as_ref().is_some_and(|b| b.is_suspended())
    }
}

impl fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("id", &self.id)
            .field("alive", &self.alive)
            .field("next_wakeup", &self.next_wakeup)
            .field("suspended", &self.is_suspended())
            .finish()
    }
}

/// One per-agent error, as reported to observers.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentFailure {
    pub agent:   AgentId,
    pub time:    SimTime,
    /// Stable category (`"InvalidDelay"`, `"PredicateError"`, ...).
    pub kind:    &'static str,
    pub message: String,
    /// Whether the agent was killed.  Only `InvalidDelay` leaves it alive.
    pub fatal:   bool,
}

impl AgentFailure {
    pub(crate) fn new(agent: AgentId, time: SimTime, error: &AgentError, fatal: bool) -> Self {
        AgentFailure {
            agent,
            time,
            kind: error.label(),
            message: error.to_string(),
            fatal,
        }
    }
}

impl fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {} ({})", self.agent, self.time, self.kind, self.message)
    }
}
