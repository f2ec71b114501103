//! Observer hooks for progress reporting, data collection, and error
//! reporting.

use sn_agent::World;
use sn_core::SimTime;

use crate::{AgentFailure, RunSummary, TickReport};

/// Callbacks invoked by [`Model::run`][crate::Model::run].
///
/// Every method has a no-op default so implementors only override what they
/// need.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_tick_end(&mut self, report: &TickReport) {
///         println!("{}: woke {} agents", report.time, report.activated.len());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Before tick `step` (1-based) runs at `time`.
    fn on_tick_start(&mut self, _step: u64, _time: SimTime) {}

    /// After a tick's activations, with the world as they left it.
    ///
    /// This is where reporters read globals and agent attributes.  Blocking
    /// I/O belongs here or in `on_sim_end`, never inside agent logic.
    fn collect(&mut self, _time: SimTime, _world: &World) {}

    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// One per-agent failure.  Called before `collect` for the same tick.
    fn on_agent_error(&mut self, _failure: &AgentFailure) {}

    /// Once, after the last tick.
    fn on_sim_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Forward every hook to both observers, `A` first.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn on_tick_start(&mut self, step: u64, time: SimTime) {
        self.0.on_tick_start(step, time);
        self.1.on_tick_start(step, time);
    }

    fn collect(&mut self, time: SimTime, world: &World) {
        self.0.collect(time, world);
        self.1.collect(time, world);
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.0.on_tick_end(report);
        self.1.on_tick_end(report);
    }

    fn on_agent_error(&mut self, failure: &AgentFailure) {
        self.0.on_agent_error(failure);
        self.1.on_agent_error(failure);
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        self.0.on_sim_end(summary);
        self.1.on_sim_end(summary);
    }
}
