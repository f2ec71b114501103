//! In-memory backend: keeps every row, for tests and post-run analysis
//! without touching the filesystem.

use sn_core::Value;

use crate::writer::OutputWriter;
use crate::{AgentValueRow, FailureRow, ModelValueRow, OutputError, OutputResult, TickSummaryRow};

#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub agent_values: Vec<AgentValueRow>,
    pub model_values: Vec<ModelValueRow>,
    pub summaries:    Vec<TickSummaryRow>,
    pub failures:     Vec<FailureRow>,
    finished:         bool,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `(time, value)` pairs of one agent attribute, in collection order.
    pub fn agent_series(&self, agent_id: u32, attr: &str) -> Vec<(f64, Value)> {
        self.agent_values
            .iter()
            .filter(|r| r.agent_id == agent_id && r.attr == attr)
            .map(|r| (r.time, r.value.clone()))
            .collect()
    }

    /// `(time, value)` pairs of one model key, in collection order.
    pub fn model_series(&self, key: &str) -> Vec<(f64, Value)> {
        self.model_values
            .iter()
            .filter(|r| r.key == key)
            .map(|r| (r.time, r.value.clone()))
            .collect()
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished) } else { Ok(()) }
    }
}

impl OutputWriter for MemoryWriter {
    fn write_agent_values(&mut self, rows: &[AgentValueRow]) -> OutputResult<()> {
        self.check_open()?;
        self.agent_values.extend_from_slice(rows);
        Ok(())
    }

    fn write_model_values(&mut self, rows: &[ModelValueRow]) -> OutputResult<()> {
        self.check_open()?;
        self.model_values.extend_from_slice(rows);
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.check_open()?;
        self.summaries.push(*row);
        Ok(())
    }

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()> {
        self.check_open()?;
        self.failures.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        Ok(())
    }
}
