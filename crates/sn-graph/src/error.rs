//! Topology error type.

use thiserror::Error;

use sn_core::NodeId;

/// Errors produced by `sn-graph`.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("node {0} not found in topology")]
    NodeNotFound(NodeId),

    #[error("no edge between {0} and {1}")]
    EdgeNotFound(NodeId, NodeId),

    #[error("self-loop on {0} is not allowed")]
    SelfLoop(NodeId),
}

pub type GraphResult<T> = Result<T, GraphError>;
