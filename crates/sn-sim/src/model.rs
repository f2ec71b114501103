//! The `Model`: one trial's world, scheduler, and run loop.

use sn_agent::{AgentKind, World};
use sn_core::{AgentId, NodeId, SimConfig, SimTime, State};

use crate::{AgentFailure, Scheduler, SimObserver, SimResult, Tick};

/// Outcome of [`Model::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub trial:       usize,
    pub final_time:  SimTime,
    /// Ticks executed.
    pub steps:       u64,
    pub activations: u64,
    pub alive:       usize,
    /// Every per-agent failure, in the order it happened.
    pub failures:    Vec<AgentFailure>,
}

/// One simulation trial.
///
/// Owns the shared [`World`] and the [`Scheduler`].  Create via
/// [`ModelBuilder`](crate::ModelBuilder).
pub struct Model {
    pub(crate) config:      SimConfig,
    pub(crate) trial:       usize,
    pub(crate) world:       World,
    pub(crate) scheduler:   Scheduler,
    pub(crate) failures:    Vec<AgentFailure>,
    pub(crate) activations: u64,
}

impl Model {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn trial(&self) -> usize {
        self.trial
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access between ticks (e.g. to change globals).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn steps(&self) -> u64 {
        self.scheduler.steps()
    }

    pub fn alive_count(&self) -> usize {
        self.scheduler.alive_count()
    }

    pub fn failures(&self) -> &[AgentFailure] {
        &self.failures
    }

    // ── Population changes between ticks ─────────────────────────────────

    /// Add an agent of `kind`.  It first runs on the next tick, at the
    /// current time.  `attrs` override the kind's defaults.
    pub fn add_agent(&mut self, kind: &AgentKind, node: Option<NodeId>, attrs: State) -> SimResult<AgentId> {
        let mut merged = kind.defaults().clone();
        merged.extend(attrs);
        self.scheduler
            .add_agent(&mut self.world, kind.name(), kind.instantiate(), node, merged)
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run exactly one tick, ignoring `max_time` and `max_steps`.
    pub fn step(&mut self) -> SimResult<Tick> {
        let tick = self.scheduler.step(&mut self.world)?;
        if let Tick::Advanced(report) = &tick {
            self.activations += report.activated.len() as u64;
            self.failures.extend(report.failures.iter().cloned());
        }
        Ok(tick)
    }

    /// `true` if the limits in the config forbid another tick.
    pub fn limit_reached(&self) -> bool {
        if self.config.max_steps.is_some_and(|max| self.steps() >= max) {
            return true;
        }
        match self.scheduler.next_time() {
            None => true,
            Some(t) => t > self.config.time_limit(),
        }
    }

    /// Run until the scheduler completes or a configured limit is reached.
    ///
    /// A tick whose time would exceed `max_time` is never started, so with
    /// `max_time = 5` and Δ = 1 the last tick runs at `t=5`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        tracing::info!(
            name = %self.config.name,
            trial = self.trial,
            seed = self.config.trial_seed(self.trial),
            agents = self.world.agent_count(),
            "run start"
        );
        while !self.limit_reached() {
            let Some(time) = self.scheduler.next_time() else { break };
            observer.on_tick_start(self.steps() + 1, time);
            match self.step()? {
                Tick::Complete => break,
                Tick::Advanced(report) => {
                    for failure in &report.failures {
                        observer.on_agent_error(failure);
                    }
                    observer.collect(report.time, &self.world);
                    observer.on_tick_end(&report);
                }
            }
        }
        let summary = self.summary();
        tracing::info!(
            trial = self.trial,
            final_time = %summary.final_time,
            steps = summary.steps,
            alive = summary.alive,
            failures = summary.failures.len(),
            "run end"
        );
        observer.on_sim_end(&summary);
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            trial:       self.trial,
            final_time:  self.now(),
            steps:       self.steps(),
            activations: self.activations,
            alive:       self.alive_count(),
            failures:    self.failures.clone(),
        }
    }
}
