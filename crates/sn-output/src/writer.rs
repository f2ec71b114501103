//! The `OutputWriter` trait implemented by all backend writers.

use crate::{AgentValueRow, FailureRow, ModelValueRow, OutputResult, TickSummaryRow};

/// Trait implemented by the CSV, SQLite, Parquet, and in-memory writers.
///
/// The observer never sees these errors directly; they are stored and
/// retrieved with [`ReporterObserver::take_error`](crate::ReporterObserver::take_error).
pub trait OutputWriter {
    fn write_agent_values(&mut self, rows: &[AgentValueRow]) -> OutputResult<()>;

    fn write_model_values(&mut self, rows: &[ModelValueRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
