//! Suspendable steps.
//!
//! A [`Process`] is a step that can pause part-way through, ask to be woken
//! later, and pick up where it left off on its next activation.  Its locals
//! and program position are ordinary fields, so suspension is just "return
//! from `resume` and keep `self` around".
//!
//! [`ProcessAgent`] owns the live cursor.  When the process finishes, the
//! cursor is dropped and the next activation starts a fresh one from the
//! factory.

use sn_core::Value;
use sn_schedule::WakeupSpec;

use crate::{Agent, AgentContext, AgentError, AgentResult, Condition, Step, Wakeup};

/// What a suspended process handed back.
#[derive(Debug)]
pub enum Yielded {
    Wakeup(Wakeup),
    /// A raw value: numbers are delays, null is the default interval,
    /// anything else is rejected.
    Value(Value),
}

impl Yielded {
    /// Coerce into a wakeup request.
    pub fn into_wakeup(self) -> AgentResult<Wakeup> {
        match self {
            Yielded::Wakeup(w) => Ok(w),
            Yielded::Value(Value::Null) => Ok(WakeupSpec::Default),
            Yielded::Value(v) => match v {
                Value::Int(_) | Value::Float(_) => {
                    Ok(WakeupSpec::After(v.as_f64().unwrap_or(f64::NAN)))
                }
                other => Err(AgentError::InvalidYield(format!("{} `{other}`", other.type_name()))),
            },
        }
    }
}

impl From<Wakeup> for Yielded {
    fn from(w: Wakeup) -> Self {
        Yielded::Wakeup(w)
    }
}

impl From<f64> for Yielded {
    fn from(delay: f64) -> Self {
        Yielded::Wakeup(WakeupSpec::After(delay))
    }
}

impl From<Value> for Yielded {
    fn from(v: Value) -> Self {
        Yielded::Value(v)
    }
}

/// Result of one [`Process::resume`].
///
/// `R` is what a finished process hands back: a [`Step`] for a whole agent,
/// a [`Transition`](crate::Transition) for one FSM state.
#[derive(Debug)]
pub enum Resume<R = Step> {
    /// Suspend; resume at the yielded wakeup.
    Yield(Yielded),
    /// Finished; the final answer.
    Return(R),
}

impl<R> Resume<R> {
    pub fn after(delay: f64) -> Self {
        Resume::Yield(Yielded::from(delay))
    }

    pub fn wait_until(cond: Condition) -> Self {
        Resume::Yield(Yielded::Wakeup(WakeupSpec::WhenTrue(cond)))
    }
}

impl<R: Default> Resume<R> {
    pub fn done() -> Self {
        Resume::Return(R::default())
    }
}

/// A resumable step.
pub trait Process<R = Step>: 'static {
    fn resume(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Resume<R>>;
}

/// Drives a [`Process`], starting a new one from `factory` whenever the
/// previous one has finished.
pub struct ProcessAgent<P, F> {
    factory: F,
    cursor:  Option<P>,
}

impl<P, F> ProcessAgent<P, F>
where
    P: Process,
    F: FnMut() -> P + 'static,
{
    pub fn new(factory: F) -> Self {
        ProcessAgent { factory, cursor: None }
    }

    /// The live cursor, if the process is suspended.
    pub fn cursor(&self) -> Option<&P> {
        self.cursor.as_ref()
    }
}

impl<P, F> Agent for ProcessAgent<P, F>
where
    P: Process,
    F: FnMut() -> P + 'static,
{
    fn activate(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Step> {
        let factory = &mut self.factory;
        let process = self.cursor.get_or_insert_with(factory);
        let outcome = process.resume(ctx).and_then(|r| match r {
            Resume::Yield(y) => y.into_wakeup().map(|w| (Step::Wake(w), true)),
            Resume::Return(step) => Ok((step, false)),
        });
        match outcome {
            Ok((step, suspended)) => {
                if !suspended {
                    self.cursor = None;
                }
                Ok(step)
            }
            Err(e) => {
                self.cursor = None;
                Err(e)
            }
        }
    }

    fn is_suspended(&self) -> bool {
        self.cursor.is_some()
    }
}
