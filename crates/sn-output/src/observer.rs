//! `ReporterObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use sn_agent::{World, STATE_ID};
use sn_core::{SimTime, Value};
use sn_sim::{AgentFailure, RunSummary, SimObserver, TickReport};

use crate::row::{AgentValueRow, FailureRow, ModelValueRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Built-in model reporter: number of live agents.
pub const AGENT_COUNT: &str = "agent_count";

/// Which values get reported.
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    /// Agent attributes to report.  Empty reports every attribute.
    /// `state_id` is always reported when an agent has one.
    pub agent_attrs: Vec<String>,
    /// Globals to report.  Empty reports every global.
    /// `agent_count` is always reported.
    pub model_keys:  Vec<String>,
    /// Collect every `every` ticks (1 = every tick).
    pub every:       u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self { agent_attrs: Vec::new(), model_keys: Vec::new(), every: 1 }
    }
}

impl ReporterConfig {
    fn wants_attr(&self, attr: &str) -> bool {
        attr == STATE_ID || self.agent_attrs.is_empty() || self.agent_attrs.iter().any(|a| a == attr)
    }

    fn wants_global(&self, key: &str) -> bool {
        self.model_keys.is_empty() || self.model_keys.iter().any(|k| k == key)
    }
}

/// A [`SimObserver`] that turns world snapshots, tick reports, and agent
/// failures into rows for any [`OutputWriter`] backend.
///
/// Errors from the writer are stored because `SimObserver` methods have no
/// return value.  After `model.run()` returns, check with
/// [`take_error`][Self::take_error].
pub struct ReporterObserver<W: OutputWriter> {
    writer:     W,
    trial:      u32,
    config:     ReporterConfig,
    collected:  u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> ReporterObserver<W> {
    pub fn new(writer: W, trial: usize, config: ReporterConfig) -> Self {
        Self {
            writer,
            trial: trial as u32,
            config,
            collected: 0,
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `model.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwrap the inner writer (e.g. to inspect rows after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                tracing::warn!(trial = self.trial, error = %e, "output write failed");
                self.last_error = Some(e);
            }
        }
    }

    fn model_rows(&self, time: f64, world: &World) -> Vec<ModelValueRow> {
        let mut rows = vec![ModelValueRow {
            trial: self.trial,
            time,
            key: AGENT_COUNT.to_owned(),
            value: Value::from(world.alive_count() as i64),
        }];
        rows.extend(
            world
                .globals
                .iter()
                .filter(|(k, _)| self.config.wants_global(k))
                .map(|(k, v)| ModelValueRow { trial: self.trial, time, key: k.clone(), value: v.clone() }),
        );
        rows
    }

    fn agent_rows(&self, time: f64, world: &World) -> Vec<AgentValueRow> {
        let config = &self.config;
        let trial = self.trial;
        world
            .alive_agents()
            .flat_map(move |record| {
                record
                    .attrs
                    .iter()
                    .filter(move |(k, _)| config.wants_attr(k))
                    .map(move |(k, v)| AgentValueRow {
                        trial,
                        time,
                        agent_id: record.id.0,
                        attr: k.clone(),
                        value: v.clone(),
                    })
            })
            .collect()
    }
}

impl<W: OutputWriter> SimObserver for ReporterObserver<W> {
    fn collect(&mut self, time: SimTime, world: &World) {
        let n = self.collected;
        self.collected += 1;
        if n % self.config.every.max(1) != 0 {
            return;
        }
        let time = time.value();
        let model = self.model_rows(time, world);
        let agents = self.agent_rows(time, world);
        let result = self.writer.write_model_values(&model);
        self.store_err(result);
        if !agents.is_empty() {
            let result = self.writer.write_agent_values(&agents);
            self.store_err(result);
        }
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        let row = TickSummaryRow {
            trial:     self.trial,
            step:      report.step,
            time:      report.time.value(),
            activated: report.activated.len() as u64,
            failures:  report.failures.len() as u64,
            spawned:   report.spawned.len() as u64,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_agent_error(&mut self, failure: &AgentFailure) {
        let row = FailureRow {
            trial:    self.trial,
            time:     failure.time.value(),
            agent_id: failure.agent.0,
            kind:     failure.kind.to_owned(),
            message:  failure.message.clone(),
            fatal:    failure.fatal,
        };
        let result = self.writer.write_failure(&row);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _summary: &RunSummary) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
