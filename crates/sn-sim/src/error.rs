use thiserror::Error;

use sn_agent::AgentError;
use sn_core::CoreError;
use sn_graph::GraphError;

/// Model-level errors.  Per-agent failures never show up here; they are
/// reported as [`AgentFailure`](crate::AgentFailure)s and the run goes on.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown agent kind `{0}`")]
    UnknownKind(String),

    /// Building the initial population failed.
    #[error("population error: {0}")]
    Population(#[from] AgentError),

    #[error("topology error: {0}")]
    Graph(#[from] GraphError),

    /// The scheduling structures are corrupt.  Fatal to the whole run.
    #[error("scheduler invariant violated: {0}")]
    SchedulerInvariant(String),
}

impl SimError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SimError::SchedulerInvariant(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
