//! Per-trial observers: the file reporter and an in-process tally.

use std::path::{Path, PathBuf};

use sn_agent::World;
use sn_core::SimTime;
use sn_output::{OutputError, OutputResult, OutputWriter, ReporterConfig, ReporterObserver};
use sn_sim::{AgentFailure, RunSummary, SimObserver, TickReport};

use crate::behavior::{INFECTED, RECOVERED, SUSCEPTIBLE};

/// Opens a backend in a directory.
pub type Open<W> = fn(&Path) -> OutputResult<W>;

/// Directory for trial `trial` under `root`.
pub fn trial_dir(root: &Path, trial: usize) -> PathBuf {
    root.join(format!("trial_{trial:03}"))
}

// ── TrialReporter ─────────────────────────────────────────────────────────────

/// A [`ReporterObserver`] writing into its own trial directory.
///
/// Opening the backend cannot fail the run: the error is kept and the
/// reporter stays silent until [`finish`](Self::finish) hands it back.
pub struct TrialReporter<W: OutputWriter> {
    dir:   PathBuf,
    inner: Result<ReporterObserver<W>, OutputError>,
}

impl<W: OutputWriter> TrialReporter<W> {
    pub fn open(root: &Path, trial: usize, config: ReporterConfig, open: Open<W>) -> Self {
        let dir = trial_dir(root, trial);
        let inner = std::fs::create_dir_all(&dir)
            .map_err(OutputError::from)
            .and_then(|()| open(&dir))
            .map(|writer| ReporterObserver::new(writer, trial, config));
        Self { dir, inner }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The first error the backend hit, if any.
    pub fn finish(self) -> OutputResult<()> {
        match self.inner {
            Ok(mut reporter) => reporter.take_error().map_or(Ok(()), Err),
            Err(e) => Err(e),
        }
    }
}

impl<W: OutputWriter> SimObserver for TrialReporter<W> {
    fn collect(&mut self, time: SimTime, world: &World) {
        if let Ok(r) = &mut self.inner {
            r.collect(time, world);
        }
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        if let Ok(r) = &mut self.inner {
            r.on_tick_end(report);
        }
    }

    fn on_agent_error(&mut self, failure: &AgentFailure) {
        if let Ok(r) = &mut self.inner {
            r.on_agent_error(failure);
        }
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        if let Ok(r) = &mut self.inner {
            r.on_sim_end(summary);
        }
    }
}

// ── Tally ─────────────────────────────────────────────────────────────────────

/// Compartment sizes after the last collected tick, plus the peak number
/// of simultaneous infections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub susceptible:   usize,
    pub infected:      usize,
    pub recovered:     usize,
    pub peak_infected: usize,
}

impl SimObserver for Tally {
    fn collect(&mut self, _time: SimTime, world: &World) {
        self.susceptible = world.count_in_state(SUSCEPTIBLE);
        self.infected = world.count_in_state(INFECTED);
        self.recovered = world.count_in_state(RECOVERED);
        self.peak_infected = self.peak_infected.max(self.infected);
    }
}
