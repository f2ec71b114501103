//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! four tables: `agent_values`, `model_values`, `tick_summaries`, `failures`.
//! Values are stored with their native SQLite storage class.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

use sn_core::Value;

use crate::writer::OutputWriter;
use crate::{AgentValueRow, FailureRow, ModelValueRow, OutputError, OutputResult, TickSummaryRow};

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS agent_values (
                 trial      INTEGER NOT NULL,
                 time       REAL    NOT NULL,
                 agent_id   INTEGER NOT NULL,
                 attr       TEXT    NOT NULL,
                 value_type TEXT    NOT NULL,
                 value
             );
             CREATE TABLE IF NOT EXISTS model_values (
                 trial      INTEGER NOT NULL,
                 time       REAL    NOT NULL,
                 key        TEXT    NOT NULL,
                 value_type TEXT    NOT NULL,
                 value
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 trial     INTEGER NOT NULL,
                 step      INTEGER NOT NULL,
                 time      REAL    NOT NULL,
                 activated INTEGER NOT NULL,
                 failures  INTEGER NOT NULL,
                 spawned   INTEGER NOT NULL,
                 PRIMARY KEY (trial, step)
             );
             CREATE TABLE IF NOT EXISTS failures (
                 trial    INTEGER NOT NULL,
                 time     REAL    NOT NULL,
                 agent_id INTEGER NOT NULL,
                 kind     TEXT    NOT NULL,
                 fatal    INTEGER NOT NULL,
                 message  TEXT    NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished) } else { Ok(()) }
    }
}

impl OutputWriter for SqliteWriter {
    fn write_agent_values(&mut self, rows: &[AgentValueRow]) -> OutputResult<()> {
        self.check_open()?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO agent_values (trial, time, agent_id, attr, value_type, value) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.trial,
                    row.time,
                    row.agent_id,
                    row.attr,
                    row.value.type_name(),
                    sql_value(&row.value),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_model_values(&mut self, rows: &[ModelValueRow]) -> OutputResult<()> {
        self.check_open()?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO model_values (trial, time, key, value_type, value) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.trial,
                    row.time,
                    row.key,
                    row.value.type_name(),
                    sql_value(&row.value),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.check_open()?;
        self.conn.execute(
            "INSERT INTO tick_summaries (trial, step, time, activated, failures, spawned) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![row.trial, row.step, row.time, row.activated, row.failures, row.spawned],
        )?;
        Ok(())
    }

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()> {
        self.check_open()?;
        self.conn.execute(
            "INSERT INTO failures (trial, time, agent_id, kind, fatal, message) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![row.trial, row.time, row.agent_id, row.kind, row.fatal, row.message],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
