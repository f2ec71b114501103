//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `agent_values.csv`
//! - `model_values.csv`
//! - `tick_summaries.csv`
//! - `failures.csv`
//!
//! Values are written as text with a `value_type` column alongside.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentValueRow, FailureRow, ModelValueRow, OutputError, OutputResult, TickSummaryRow};

/// Writes simulation output to four CSV files.
pub struct CsvWriter {
    agents:    Writer<File>,
    model:     Writer<File>,
    summaries: Writer<File>,
    failures:  Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create the CSV files in `dir` (which must exist) and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut agents = Writer::from_path(dir.join("agent_values.csv"))?;
        agents.write_record(["trial", "time", "agent_id", "attr", "value_type", "value"])?;

        let mut model = Writer::from_path(dir.join("model_values.csv"))?;
        model.write_record(["trial", "time", "key", "value_type", "value"])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(["trial", "step", "time", "activated", "failures", "spawned"])?;

        let mut failures = Writer::from_path(dir.join("failures.csv"))?;
        failures.write_record(["trial", "time", "agent_id", "kind", "fatal", "message"])?;

        Ok(Self { agents, model, summaries, failures, finished: false })
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished) } else { Ok(()) }
    }
}

impl OutputWriter for CsvWriter {
    fn write_agent_values(&mut self, rows: &[AgentValueRow]) -> OutputResult<()> {
        self.check_open()?;
        for row in rows {
            self.agents.write_record(&[
                row.trial.to_string(),
                row.time.to_string(),
                row.agent_id.to_string(),
                row.attr.clone(),
                row.value.type_name().to_owned(),
                row.value.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_model_values(&mut self, rows: &[ModelValueRow]) -> OutputResult<()> {
        self.check_open()?;
        for row in rows {
            self.model.write_record(&[
                row.trial.to_string(),
                row.time.to_string(),
                row.key.clone(),
                row.value.type_name().to_owned(),
                row.value.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.check_open()?;
        self.summaries.write_record(&[
            row.trial.to_string(),
            row.step.to_string(),
            row.time.to_string(),
            row.activated.to_string(),
            row.failures.to_string(),
            row.spawned.to_string(),
        ])?;
        Ok(())
    }

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()> {
        self.check_open()?;
        self.failures.write_record(&[
            row.trial.to_string(),
            row.time.to_string(),
            row.agent_id.to_string(),
            row.kind.clone(),
            (row.fatal as u8).to_string(),
            row.message.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.agents.flush()?;
        self.model.flush()?;
        self.summaries.flush()?;
        self.failures.flush()?;
        Ok(())
    }
}
