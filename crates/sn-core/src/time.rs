//! Simulated time.
//!
//! # Design
//!
//! Time is a real number wrapped in [`SimTime`].  Agents may sleep for
//! fractional durations (e.g. exponentially distributed delays), so an
//! integer tick counter is not enough.  `SimTime` is totally ordered:
//! construction rejects NaN and comparisons use `f64::total_cmp`, which lets
//! it key a `BTreeMap` of time buckets directly.
//!
//! Two sentinels sit at the ends of the line:
//!
//! | Sentinel          | Value  | Meaning                                       |
//! |-------------------|--------|-----------------------------------------------|
//! | [`SimTime::NEVER`] | `+∞`  | the agent is never woken again                |
//! | [`SimTime::NOW`]   | `-∞`  | "as soon as possible"; clamps to current time |
//!
//! Adding a non-negative delay to `NEVER` yields `NEVER`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An instant of simulated time.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);
    pub const NEVER: SimTime = SimTime(f64::INFINITY);
    pub const NOW: SimTime = SimTime(f64::NEG_INFINITY);

    /// Wrap `value`, or `None` if it is NaN.
    #[inline]
    pub fn new(value: f64) -> Option<SimTime> {
        if value.is_nan() {
            None
        } else {
            // Fold -0.0 into 0.0 so equal instants compare equal under total_cmp.
            Some(SimTime(value + 0.0))
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_never(self) -> bool {
        self.0 == f64::INFINITY
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// The instant `delay` after `self`.
    ///
    /// `NEVER` absorbs any delay; a result that would be NaN collapses to `NEVER`.
    #[inline]
    pub fn offset(self, delay: f64) -> SimTime {
        if self.is_never() {
            return SimTime::NEVER;
        }
        SimTime::new(self.0 + delay).unwrap_or(SimTime::NEVER)
    }

    /// Simulated time elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::ZERO
    }
}

impl From<f64> for SimTime {
    /// NaN maps to [`SimTime::NEVER`].
    fn from(value: f64) -> Self {
        SimTime::new(value).unwrap_or(SimTime::NEVER)
    }
}

impl From<u32> for SimTime {
    fn from(value: u32) -> Self {
        SimTime(value as f64)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        self.offset(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            f.write_str("never")
        } else if self.0 == f64::NEG_INFINITY {
            f.write_str("now")
        } else {
            write!(f, "t={}", self.0)
        }
    }
}
