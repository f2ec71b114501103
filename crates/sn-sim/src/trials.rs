//! Running several independent trials of one simulation.
//!
//! Trials share nothing mutable: each one builds its own [`Model`] (and so
//! its own agents) inside the worker that runs it.  Results are gathered
//! only after every trial finishes, ordered by trial index.

use sn_core::SimConfig;

use crate::{Model, RunSummary, SimObserver, SimResult};

/// Result of one trial.
pub struct TrialOutcome<O> {
    pub trial:    usize,
    pub summary:  RunSummary,
    pub observer: O,
}

/// Run `config.num_trials` trials.
///
/// `build(k)` creates the model for trial `k` (typically via
/// `ModelBuilder::new(config).trial(k)`), `observe(k)` its observer.  With
/// the `parallel` feature and `config.parallel` set, trials run on Rayon's
/// thread pool; the returned vector is in trial order either way.  The first
/// fatal error aborts the whole batch.
pub fn run_trials<O, B, F>(config: &SimConfig, build: B, observe: F) -> SimResult<Vec<TrialOutcome<O>>>
where
    O: SimObserver + Send,
    B: Fn(usize) -> SimResult<Model> + Sync,
    F: Fn(usize) -> O + Sync,
{
    config.validate()?;
    let run_one = |trial: usize| -> SimResult<TrialOutcome<O>> {
        let mut model = build(trial)?;
        let mut observer = observe(trial);
        let summary = model.run(&mut observer)?;
        Ok(TrialOutcome { trial, summary, observer })
    };

    #[cfg(feature = "parallel")]
    if config.parallel {
        use rayon::prelude::*;
        return (0..config.num_trials).into_par_iter().map(run_one).collect();
    }

    (0..config.num_trials).map(run_one).collect()
}
