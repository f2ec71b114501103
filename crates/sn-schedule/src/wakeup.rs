//! Wakeup requests and their resolution into absolute times.

use std::fmt;

use sn_core::SimTime;

use crate::{ScheduleError, ScheduleResult};

/// When an agent wants to be activated again.
///
/// `C` is the predicate type for [`WakeupSpec::WhenTrue`].
pub enum WakeupSpec<C> {
    /// No earlier than the given absolute time.
    At(SimTime),
    /// No earlier than `now + delay`.
    After(f64),
    /// At the first tick where the predicate holds.
    WhenTrue(C),
    /// `After(Δ)`, with Δ the model's configured interval.
    Default,
}

impl<C> Default for WakeupSpec<C> {
    fn default() -> Self {
        WakeupSpec::Default
    }
}

impl<C> fmt::Debug for WakeupSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeupSpec::At(t) => write!(f, "At({t})"),
            WakeupSpec::After(d) => write!(f, "After({d})"),
            WakeupSpec::WhenTrue(_) => f.write_str("WhenTrue(..)"),
            WakeupSpec::Default => f.write_str("Default"),
        }
    }
}

impl<C> WakeupSpec<C> {
    /// Transform the predicate, keeping every other variant.
    pub fn map_condition<D>(self, f: impl FnOnce(C) -> D) -> WakeupSpec<D> {
        match self {
            WakeupSpec::At(t) => WakeupSpec::At(t),
            WakeupSpec::After(d) => WakeupSpec::After(d),
            WakeupSpec::WhenTrue(c) => WakeupSpec::WhenTrue(f(c)),
            WakeupSpec::Default => WakeupSpec::Default,
        }
    }
}

/// Outcome of [`resolve`].
pub enum Resolved<C> {
    /// Reinsert into the time bucket for this instant.
    At(SimTime),
    /// Park in the pending-condition set.
    Pending(C),
}

impl<C> Resolved<C> {
    pub fn time(&self) -> Option<SimTime> {
        match self {
            Resolved::At(t) => Some(*t),
            Resolved::Pending(_) => None,
        }
    }
}

/// Normalise `spec` against the current time and default interval.
///
/// Times in the past are clamped to `now`, so the schedule never moves
/// backwards.  A negative (or NaN) delay is rejected.
pub fn resolve<C>(spec: WakeupSpec<C>, now: SimTime, interval: f64) -> ScheduleResult<Resolved<C>> {
    match spec {
        WakeupSpec::At(t) => Ok(Resolved::At(t.max(now))),
        WakeupSpec::After(delay) => {
            if delay.is_nan() || delay < 0.0 {
                return Err(ScheduleError::InvalidDelay(delay));
            }
            Ok(Resolved::At(now + delay))
        }
        WakeupSpec::WhenTrue(c) => Ok(Resolved::Pending(c)),
        WakeupSpec::Default => Ok(Resolved::At(now + interval)),
    }
}
