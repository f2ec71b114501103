//! Unit tests for sn-output writers and the reporter observer.

use sn_core::Value;

use crate::row::{AgentValueRow, FailureRow, ModelValueRow, TickSummaryRow};

fn agent_row(agent_id: u32, time: f64, attr: &str, value: impl Into<Value>) -> AgentValueRow {
    AgentValueRow { trial: 0, time, agent_id, attr: attr.to_owned(), value: value.into() }
}

fn model_row(time: f64, key: &str, value: impl Into<Value>) -> ModelValueRow {
    ModelValueRow { trial: 0, time, key: key.to_owned(), value: value.into() }
}

fn summary_row(step: u64) -> TickSummaryRow {
    TickSummaryRow { trial: 0, step, time: step as f64, activated: 2, failures: 0, spawned: 0 }
}

fn failure_row() -> FailureRow {
    FailureRow {
        trial:    0,
        time:     3.0,
        agent_id: 7,
        kind:     "StepError".to_owned(),
        message:  "boom".to_owned(),
        fatal:    true,
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::writer::OutputWriter;
    use crate::OutputError;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn records(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr
            .records()
            .map(|r| r.unwrap().iter().map(str::to_owned).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        for name in ["agent_values.csv", "model_values.csv", "tick_summaries.csv", "failures.csv"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (agents, _) = records(&dir.path().join("agent_values.csv"));
        assert_eq!(agents, ["trial", "time", "agent_id", "attr", "value_type", "value"]);

        let (model, _) = records(&dir.path().join("model_values.csv"));
        assert_eq!(model, ["trial", "time", "key", "value_type", "value"]);

        let (summaries, _) = records(&dir.path().join("tick_summaries.csv"));
        assert_eq!(summaries, ["trial", "step", "time", "activated", "failures", "spawned"]);

        let (failures, _) = records(&dir.path().join("failures.csv"));
        assert_eq!(failures, ["trial", "time", "agent_id", "kind", "fatal", "message"]);
    }

    #[test]
    fn csv_values_carry_their_type() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_agent_values(&[
            agent_row(0, 1.0, "state_id", "infected"),
            agent_row(0, 1.0, "age", 42i64),
            agent_row(1, 1.0, "note", Value::Null),
        ])
        .unwrap();
        w.finish().unwrap();

        let (_, rows) = records(&dir.path().join("agent_values.csv"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ["0", "1", "0", "state_id", "text", "infected"]);
        assert_eq!(rows[1][4..], ["int", "42"]);
        assert_eq!(rows[2][4..], ["null", ""]);
    }

    #[test]
    fn csv_failure_row() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_failure(&failure_row()).unwrap();
        w.write_tick_summary(&summary_row(0)).unwrap();
        w.write_tick_summary(&summary_row(1)).unwrap();
        w.finish().unwrap();

        let (_, failures) = records(&dir.path().join("failures.csv"));
        assert_eq!(failures, [["0", "3", "7", "StepError", "1", "boom"]]);

        let (_, summaries) = records(&dir.path().join("tick_summaries.csv"));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1][1], "1");
    }

    #[test]
    fn csv_finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_write_after_finish_fails() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        let err = w.write_model_values(&[model_row(0.0, "k", 1i64)]).unwrap_err();
        assert!(matches!(err, OutputError::Finished));
    }

    #[test]
    fn csv_missing_dir_errors() {
        let dir = tmp();
        let missing = dir.path().join("does_not_exist");
        assert!(CsvWriter::new(&missing).is_err());
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod memory_tests {
    use super::*;

    use crate::memory::MemoryWriter;
    use crate::writer::OutputWriter;
    use crate::OutputError;

    #[test]
    fn series_filter_by_agent_and_attr() {
        let mut w = MemoryWriter::new();
        w.write_agent_values(&[
            agent_row(0, 0.0, "state_id", "neutral"),
            agent_row(1, 0.0, "state_id", "infected"),
            agent_row(0, 1.0, "state_id", "infected"),
            agent_row(0, 1.0, "age", 3i64),
        ])
        .unwrap();

        assert_eq!(
            w.agent_series(0, "state_id"),
            vec![(0.0, Value::from("neutral")), (1.0, Value::from("infected"))]
        );
        assert!(w.agent_series(2, "state_id").is_empty());
    }

    #[test]
    fn model_series_in_order() {
        let mut w = MemoryWriter::new();
        w.write_model_values(&[model_row(0.0, "agent_count", 2i64), model_row(0.0, "phase", "a")])
            .unwrap();
        w.write_model_values(&[model_row(1.0, "agent_count", 3i64)]).unwrap();
        assert_eq!(
            w.model_series("agent_count"),
            vec![(0.0, Value::Int(2)), (1.0, Value::Int(3))]
        );
    }

    #[test]
    fn finish_closes_writer() {
        let mut w = MemoryWriter::new();
        w.write_failure(&failure_row()).unwrap();
        assert!(!w.is_finished());
        w.finish().unwrap();
        w.finish().unwrap();
        assert!(w.is_finished());
        assert!(matches!(w.write_tick_summary(&summary_row(0)), Err(OutputError::Finished)));
        assert_eq!(w.failures.len(), 1);
    }
}

// ── ReporterObserver ──────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use sn_agent::{
        AgentContext, AgentError, AgentKind, AgentResult, StateTable, Step, Transition, STATE_ID,
        from_fn,
    };
    use sn_core::{NodeId, SimConfig, State, Value};
    use sn_graph::generators;
    use sn_sim::{Model, ModelBuilder};

    use crate::memory::MemoryWriter;
    use crate::observer::{ReporterConfig, ReporterObserver, AGENT_COUNT};

    fn config(max_time: f64) -> SimConfig {
        SimConfig { name: "test".to_owned(), seed: 7, max_time: Some(max_time), ..SimConfig::default() }
    }

    fn neutral(_: &mut (), ctx: &mut AgentContext<'_>) -> AgentResult<Transition> {
        if ctx.count_neighbors_in_state("infected") > 0 {
            let now = ctx.now().value();
            ctx.set("infected_at", now);
            Ok(Transition::to("infected"))
        } else {
            Ok(Transition::stay())
        }
    }

    fn infected(_: &mut (), _: &mut AgentContext<'_>) -> AgentResult<Transition> {
        Ok(Transition::stay())
    }

    fn person() -> AgentKind {
        let table = StateTable::builder()
            .default_state("neutral", neutral)
            .state("infected", infected)
            .build()
            .unwrap();
        AgentKind::fsm("person", table, || ()).with_default("age", 30i64)
    }

    /// Two people on a path; node 0 starts infected.
    fn spread_model(max_time: f64) -> Model {
        let kind = person();
        let mut patient_zero = State::new();
        patient_zero.insert(STATE_ID.to_owned(), Value::from("infected"));
        ModelBuilder::new(config(max_time))
            .topology(generators::path(2))
            .global("phase", "outbreak")
            .global("beta", 0.5)
            .agent(&kind, Some(NodeId(0)), patient_zero)
            .agent(&kind, Some(NodeId(1)), State::new())
            .build()
            .unwrap()
    }

    fn run(model: &mut Model, config: ReporterConfig) -> MemoryWriter {
        let mut obs = ReporterObserver::new(MemoryWriter::new(), model.trial(), config);
        model.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());
        obs.into_writer()
    }

    #[test]
    fn reports_every_tick_by_default() {
        let mut model = spread_model(3.0);
        let w = run(&mut model, ReporterConfig::default());

        assert!(w.is_finished(), "on_sim_end must finish the writer");
        assert_eq!(w.summaries.len(), 4);
        assert_eq!(w.summaries.iter().map(|s| s.step).collect::<Vec<_>>(), [1, 2, 3, 4]);
        assert!(w.summaries.iter().all(|s| s.activated == 2));

        let counts = w.model_series(AGENT_COUNT);
        assert_eq!(counts.len(), 4);
        assert!(counts.iter().all(|(_, v)| *v == Value::Int(2)));
    }

    #[test]
    fn state_transition_visible_in_series() {
        let mut model = spread_model(3.0);
        let w = run(&mut model, ReporterConfig::default());

        let states = w.agent_series(1, STATE_ID);
        assert_eq!(states[0], (0.0, Value::from("infected")));
        assert_eq!(states.last().map(|(_, v)| v.clone()), Some(Value::from("infected")));
        assert_eq!(w.agent_series(0, STATE_ID).len(), 4);
        assert!(!w.agent_series(1, "infected_at").is_empty());
    }

    #[test]
    fn attr_filter_keeps_state_id() {
        let mut model = spread_model(1.0);
        let config = ReporterConfig { agent_attrs: vec!["age".to_owned()], ..ReporterConfig::default() };
        let w = run(&mut model, config);

        assert!(w.agent_values.iter().all(|r| r.attr == "age" || r.attr == STATE_ID));
        assert!(!w.agent_series(0, STATE_ID).is_empty());
        assert_eq!(w.agent_series(0, "age")[0].1, Value::Int(30));
        assert!(w.agent_series(1, "infected_at").is_empty());
    }

    #[test]
    fn model_key_filter_keeps_agent_count() {
        let mut model = spread_model(1.0);
        let config = ReporterConfig { model_keys: vec!["phase".to_owned()], ..ReporterConfig::default() };
        let w = run(&mut model, config);

        assert!(w.model_series("beta").is_empty());
        assert_eq!(w.model_series("phase")[0].1, Value::from("outbreak"));
        assert_eq!(w.model_series(AGENT_COUNT).len(), 2);
    }

    #[test]
    fn collects_every_nth_tick() {
        let mut model = spread_model(4.0);
        let config = ReporterConfig { every: 2, ..ReporterConfig::default() };
        let w = run(&mut model, config);

        let times: Vec<f64> = w.model_series(AGENT_COUNT).into_iter().map(|(t, _)| t).collect();
        assert_eq!(times, [0.0, 2.0, 4.0]);
        assert_eq!(w.summaries.len(), 5, "summaries are written every tick");
    }

    #[test]
    fn failures_become_rows() {
        let faulty = AgentKind::new("faulty", || {
            Box::new(from_fn(|ctx: &mut AgentContext<'_>| {
                if ctx.now().value() >= 1.0 {
                    Err(AgentError::failed("boom"))
                } else {
                    Ok(Step::default())
                }
            }))
        });
        let mut model = ModelBuilder::new(config(3.0))
            .add_agents(faulty, 1, State::new())
            .build()
            .unwrap();
        let w = run(&mut model, ReporterConfig::default());

        assert_eq!(w.failures.len(), 1);
        let row = &w.failures[0];
        assert_eq!((row.agent_id, row.time, row.fatal), (0, 1.0, true));
        assert_eq!(row.kind, "StepError");
        assert!(row.message.contains("boom"));

        assert_eq!(w.summaries[1].failures, 1);
        assert_eq!(w.model_series(AGENT_COUNT).last().map(|(_, v)| v.clone()), Some(Value::Int(0)));
    }

    #[test]
    fn trial_index_is_stamped_on_rows() {
        let mut model = spread_model(1.0);
        let mut obs = ReporterObserver::new(MemoryWriter::new(), 3, ReporterConfig::default());
        model.run(&mut obs).unwrap();
        let w = obs.into_writer();
        assert!(w.agent_values.iter().all(|r| r.trial == 3));
        assert!(w.summaries.iter().all(|r| r.trial == 3));
    }
}

// ── SQLite (feature = "sqlite") ───────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::*;
    use tempfile::TempDir;

    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn count(dir: &TempDir, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_row_counts() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_agent_values(&[agent_row(0, 0.0, "state_id", "neutral"), agent_row(1, 0.0, "age", 4i64)])
            .unwrap();
        w.write_model_values(&[model_row(0.0, "agent_count", 2i64)]).unwrap();
        w.write_tick_summary(&summary_row(0)).unwrap();
        w.write_tick_summary(&summary_row(1)).unwrap();
        w.write_failure(&failure_row()).unwrap();
        w.finish().unwrap();

        assert_eq!(count(&dir, "agent_values"), 2);
        assert_eq!(count(&dir, "model_values"), 1);
        assert_eq!(count(&dir, "tick_summaries"), 2);
        assert_eq!(count(&dir, "failures"), 1);
    }

    #[test]
    fn sqlite_keeps_native_types() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_agent_values(&[agent_row(0, 0.0, "age", 4i64), agent_row(0, 0.0, "p", 0.25)])
            .unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let age: i64 = conn
            .query_row("SELECT value FROM agent_values WHERE attr = 'age'", [], |r| r.get(0))
            .unwrap();
        let p: f64 = conn
            .query_row("SELECT value FROM agent_values WHERE attr = 'p'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(age, 4);
        assert_eq!(p, 0.25);
    }

    #[test]
    fn sqlite_duplicate_step_rejected() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&summary_row(0)).unwrap();
        assert!(w.write_tick_summary(&summary_row(0)).is_err());
    }
}

// ── Parquet (feature = "parquet") ─────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use super::*;
    use tempfile::TempDir;

    use arrow::datatypes::DataType;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use crate::parquet::ParquetWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn parquet_files_created() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        for name in ["agent_values", "model_values", "tick_summaries", "failures"] {
            assert!(dir.path().join(format!("{name}.parquet")).exists(), "{name} missing");
        }
    }

    #[test]
    fn parquet_agent_values_schema_and_rows() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_agent_values(&[agent_row(0, 0.0, "state_id", "neutral"), agent_row(1, 0.0, "note", Value::Null)])
            .unwrap();
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("agent_values.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let schema = builder.schema().clone();
        let reader = builder.build().unwrap();
        let total_rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total_rows, 2);

        let field_names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(field_names, ["trial", "time", "agent_id", "attr", "value_type", "value"]);
        assert!(schema.field_with_name("value").unwrap().is_nullable());
    }

    #[test]
    fn parquet_fatal_is_boolean() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_failure(&failure_row()).unwrap();
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("failures.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let field = builder.schema().field_with_name("fatal").unwrap().clone();
        assert_eq!(*field.data_type(), DataType::Boolean);
    }

    #[test]
    fn parquet_write_after_finish_fails() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        assert!(w.write_tick_summary(&summary_row(0)).is_err());
    }
}
