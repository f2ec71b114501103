//! Parquet output backend (feature `parquet`).
//!
//! Creates four files in the configured output directory:
//! `agent_values.parquet`, `model_values.parquet`, `tick_summaries.parquet`,
//! `failures.parquet`.  Values are stored as nullable UTF-8 next to a
//! `value_type` column.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use sn_core::Value;

use crate::writer::OutputWriter;
use crate::{AgentValueRow, FailureRow, ModelValueRow, OutputError, OutputResult, TickSummaryRow};

fn agent_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("trial",      DataType::UInt32,  false),
        Field::new("time",       DataType::Float64, false),
        Field::new("agent_id",   DataType::UInt32,  false),
        Field::new("attr",       DataType::Utf8,    false),
        Field::new("value_type", DataType::Utf8,    false),
        Field::new("value",      DataType::Utf8,    true),
    ]))
}

fn model_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("trial",      DataType::UInt32,  false),
        Field::new("time",       DataType::Float64, false),
        Field::new("key",        DataType::Utf8,    false),
        Field::new("value_type", DataType::Utf8,    false),
        Field::new("value",      DataType::Utf8,    true),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("trial",     DataType::UInt32,  false),
        Field::new("step",      DataType::UInt64,  false),
        Field::new("time",      DataType::Float64, false),
        Field::new("activated", DataType::UInt64,  false),
        Field::new("failures",  DataType::UInt64,  false),
        Field::new("spawned",   DataType::UInt64,  false),
    ]))
}

fn failure_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("trial",    DataType::UInt32,  false),
        Field::new("time",     DataType::Float64, false),
        Field::new("agent_id", DataType::UInt32,  false),
        Field::new("kind",     DataType::Utf8,    false),
        Field::new("fatal",    DataType::Boolean, false),
        Field::new("message",  DataType::Utf8,    false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

fn append_value(builder: &mut StringBuilder, value: &Value) {
    match value {
        Value::Null => builder.append_null(),
        other => builder.append_value(other.to_string()),
    }
}

/// One open Parquet file and its schema.
struct Sink {
    writer: Option<ArrowWriter<File>>,
    schema: Arc<Schema>,
}

impl Sink {
    fn create(path: &Path, schema: Arc<Schema>) -> OutputResult<Self> {
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { writer: Some(writer), schema })
    }

    fn write(&mut self, columns: Vec<ArrayRef>) -> OutputResult<()> {
        let writer = self.writer.as_mut().ok_or(OutputError::Finished)?;
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns)?;
        writer.write(&batch)?;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}

/// Writes simulation output to four Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footers; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    agents:    Sink,
    model:     Sink,
    summaries: Sink,
    failures:  Sink,
}

impl ParquetWriter {
    /// Create the Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            agents:    Sink::create(&dir.join("agent_values.parquet"), agent_schema())?,
            model:     Sink::create(&dir.join("model_values.parquet"), model_schema())?,
            summaries: Sink::create(&dir.join("tick_summaries.parquet"), summary_schema())?,
            failures:  Sink::create(&dir.join("failures.parquet"), failure_schema())?,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_agent_values(&mut self, rows: &[AgentValueRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut trials      = UInt32Builder::new();
        let mut times       = Float64Builder::new();
        let mut agent_ids   = UInt32Builder::new();
        let mut attrs       = StringBuilder::new();
        let mut value_types = StringBuilder::new();
        let mut values      = StringBuilder::new();

        for row in rows {
            trials.append_value(row.trial);
            times.append_value(row.time);
            agent_ids.append_value(row.agent_id);
            attrs.append_value(&row.attr);
            value_types.append_value(row.value.type_name());
            append_value(&mut values, &row.value);
        }

        self.agents.write(vec![
            Arc::new(trials.finish()),
            Arc::new(times.finish()),
            Arc::new(agent_ids.finish()),
            Arc::new(attrs.finish()),
            Arc::new(value_types.finish()),
            Arc::new(values.finish()),
        ])
    }

    fn write_model_values(&mut self, rows: &[ModelValueRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut trials      = UInt32Builder::new();
        let mut times       = Float64Builder::new();
        let mut keys        = StringBuilder::new();
        let mut value_types = StringBuilder::new();
        let mut values      = StringBuilder::new();

        for row in rows {
            trials.append_value(row.trial);
            times.append_value(row.time);
            keys.append_value(&row.key);
            value_types.append_value(row.value.type_name());
            append_value(&mut values, &row.value);
        }

        self.model.write(vec![
            Arc::new(trials.finish()),
            Arc::new(times.finish()),
            Arc::new(keys.finish()),
            Arc::new(value_types.finish()),
            Arc::new(values.finish()),
        ])
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        let mut trials    = UInt32Builder::new();
        let mut steps     = UInt64Builder::new();
        let mut times     = Float64Builder::new();
        let mut activated = UInt64Builder::new();
        let mut failures  = UInt64Builder::new();
        let mut spawned   = UInt64Builder::new();

        trials.append_value(row.trial);
        steps.append_value(row.step);
        times.append_value(row.time);
        activated.append_value(row.activated);
        failures.append_value(row.failures);
        spawned.append_value(row.spawned);

        self.summaries.write(vec![
            Arc::new(trials.finish()),
            Arc::new(steps.finish()),
            Arc::new(times.finish()),
            Arc::new(activated.finish()),
            Arc::new(failures.finish()),
            Arc::new(spawned.finish()),
        ])
    }

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()> {
        let mut trials    = UInt32Builder::new();
        let mut times     = Float64Builder::new();
        let mut agent_ids = UInt32Builder::new();
        let mut kinds     = StringBuilder::new();
        let mut fatals    = BooleanBuilder::new();
        let mut messages  = StringBuilder::new();

        trials.append_value(row.trial);
        times.append_value(row.time);
        agent_ids.append_value(row.agent_id);
        kinds.append_value(&row.kind);
        fatals.append_value(row.fatal);
        messages.append_value(&row.message);

        self.failures.write(vec![
            Arc::new(trials.finish()),
            Arc::new(times.finish()),
            Arc::new(agent_ids.finish()),
            Arc::new(kinds.finish()),
            Arc::new(fatals.finish()),
            Arc::new(messages.finish()),
        ])
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.agents.close()?;
        self.model.close()?;
        self.summaries.close()?;
        self.failures.close()?;
        Ok(())
    }
}
