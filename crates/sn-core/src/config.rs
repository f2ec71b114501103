//! Run configuration supplied at model-construction time.
//!
//! Typically loaded from a JSON file by the application crate and passed to
//! the model builder.  The scheduler treats every field as a plain
//! constructor input.

use crate::rng::MIXING_CONSTANT;
use crate::{CoreError, CoreResult, SimTime, State};

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Human-readable run name, used in logs and output rows.
    pub name: String,

    /// Default step interval Δ.  An agent that asks for the default cadence
    /// runs again at `now + interval`.
    pub interval: f64,

    /// Stop before the first tick whose time would exceed this value.
    pub max_time: Option<f64>,

    /// Stop after this many ticks.
    pub max_steps: Option<u64>,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Number of independent trials to run (each with its own seed).
    pub num_trials: usize,

    /// Run trials on Rayon's thread pool (requires the `parallel` feature of
    /// `sn-sim`; ignored otherwise).
    pub parallel: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name:       "unnamed".to_owned(),
            interval:   1.0,
            max_time:   None,
            max_steps:  None,
            seed:       0,
            num_trials: 1,
            parallel:   false,
        }
    }
}

impl SimConfig {
    /// Reject configurations the scheduler cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(CoreError::Config(format!(
                "interval must be finite and positive, got {}",
                self.interval
            )));
        }
        if self.num_trials == 0 {
            return Err(CoreError::Config("num_trials must be at least 1".to_owned()));
        }
        if let Some(t) = self.max_time {
            if t.is_nan() {
                return Err(CoreError::Config("max_time must not be NaN".to_owned()));
            }
        }
        Ok(())
    }

    /// Time ceiling as a `SimTime` (`NEVER` when unbounded).
    #[inline]
    pub fn time_limit(&self) -> SimTime {
        self.max_time.map_or(SimTime::NEVER, SimTime::from)
    }

    /// Deterministic seed for trial `trial`.  Trial 0 uses the master seed.
    #[inline]
    pub fn trial_seed(&self, trial: usize) -> u64 {
        self.seed ^ (trial as u64).wrapping_mul(MIXING_CONSTANT)
    }
}

// ── PopulationSpec ────────────────────────────────────────────────────────────

/// One entry of the initial population.
///
/// - With `count: Some(k)`, exactly `k` agents of `kind` are created without a
///   topology node.
/// - With `count: None`, the entry takes part in the weighted assignment of
///   one agent per topology node; `weight` is its relative share.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationSpec {
    /// Registered agent kind name.
    pub kind: String,

    #[cfg_attr(feature = "serde", serde(default = "default_weight"))]
    pub weight: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub count: Option<usize>,

    /// Initial attributes, layered over the kind's own defaults.
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: State,
}

#[cfg(feature = "serde")]
fn default_weight() -> f64 {
    1.0
}

impl PopulationSpec {
    /// A network-assigned entry with weight 1.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), weight: 1.0, count: None, state: State::new() }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<crate::Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }
}
