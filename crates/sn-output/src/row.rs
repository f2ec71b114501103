//! Plain data rows written by output backends.
//!
//! Values keep their [`Value`] type; each backend decides how to encode it.

use sn_core::Value;

/// One reported agent attribute at one collection time.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentValueRow {
    pub trial:    u32,
    pub time:     f64,
    pub agent_id: u32,
    pub attr:     String,
    pub value:    Value,
}

/// One reported model-level value (a global or a built-in reporter).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelValueRow {
    pub trial: u32,
    pub time:  f64,
    pub key:   String,
    pub value: Value,
}

/// Summary statistics for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub trial:     u32,
    pub step:      u64,
    pub time:      f64,
    pub activated: u64,
    pub failures:  u64,
    pub spawned:   u64,
}

/// One per-agent failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRow {
    pub trial:    u32,
    pub time:     f64,
    pub agent_id: u32,
    pub kind:     String,
    pub message:  String,
    pub fatal:    bool,
}

