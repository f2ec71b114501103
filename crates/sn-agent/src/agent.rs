//! The agent capability and the values an activation returns.

use std::fmt;

use sn_core::{SimTime, Value};
use sn_schedule::WakeupSpec;

use crate::{AgentContext, AgentError, AgentResult, ConditionContext, MessageId};

/// Wakeup request with the predicate type fixed to [`Condition`].
pub type Wakeup = WakeupSpec<Condition>;

// ── Agent ─────────────────────────────────────────────────────────────────────

/// Anything the scheduler can activate.
///
/// `activate` runs one step of the agent's behavior and reports when the
/// agent wants to run again.  Returning `Err` kills this agent only; the
/// rest of the population keeps going.
pub trait Agent: 'static {
    fn activate(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Step>;

    /// `true` while the agent is parked mid-way through a resumable step.
    fn is_suspended(&self) -> bool {
        false
    }
}

/// What an activation asks of the scheduler.
#[derive(Debug)]
pub enum Step {
    /// Stay alive and run again at the requested wakeup.
    Wake(Wakeup),
    /// Leave the simulation permanently.
    Die,
}

impl Default for Step {
    fn default() -> Self {
        Step::Wake(WakeupSpec::Default)
    }
}

impl From<Wakeup> for Step {
    fn from(w: Wakeup) -> Self {
        Step::Wake(w)
    }
}

impl Step {
    pub fn after(delay: f64) -> Self {
        Step::Wake(WakeupSpec::After(delay))
    }

    pub fn at(time: impl Into<SimTime>) -> Self {
        Step::Wake(WakeupSpec::At(time.into()))
    }

    pub fn when(cond: Condition) -> Self {
        Step::Wake(WakeupSpec::WhenTrue(cond))
    }

    /// Stay alive but never be activated again.
    pub fn never() -> Self {
        Step::Wake(WakeupSpec::At(SimTime::NEVER))
    }

    pub fn is_die(&self) -> bool {
        matches!(self, Step::Die)
    }
}

// ── Condition ─────────────────────────────────────────────────────────────────

type Predicate = Box<dyn FnMut(&ConditionContext<'_>) -> AgentResult<bool>>;

/// A predicate over the world, evaluated once per tick while the agent
/// waits on it.
pub struct Condition(Predicate);

impl Condition {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&ConditionContext<'_>) -> AgentResult<bool> + 'static,
    {
        Condition(Box::new(f))
    }

    pub fn check(&mut self, ctx: &ConditionContext<'_>) -> AgentResult<bool> {
        (self.0)(ctx)
    }

    /// Holds once global `key` equals `value`.
    pub fn global_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        Condition::new(move |ctx| Ok(ctx.world.global(&key) == Some(&value)))
    }

    /// Holds once the waiting agent has at least one live neighbor in `state`.
    pub fn neighbor_in_state(state: impl Into<String>) -> Self {
        let state = state.into();
        Condition::new(move |ctx| Ok(ctx.world.count_neighbors_in_state(ctx.agent, &state) > 0))
    }

    /// Holds once the waiting agent's own attribute `key` equals `value`.
    pub fn attr_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        Condition::new(move |ctx| Ok(ctx.own(&key) == Some(&value)))
    }

    /// Holds once the waiting agent's mailbox has received more than
    /// `seen` messages.  Fails with [`AgentError::TimedOut`] if nothing new
    /// has arrived by `expiration`.
    pub fn message_received(seen: u64, expiration: SimTime) -> Self {
        Condition::new(move |ctx| {
            let received = ctx.world.mailbox(ctx.agent).map_or(0, |m| m.received());
            if received > seen {
                Ok(true)
            } else if ctx.now >= expiration {
                Err(AgentError::TimedOut(format!("no message by {expiration}")))
            } else {
                Ok(false)
            }
        })
    }

    /// Holds once ask `msg` has been answered.  Fails with
    /// [`AgentError::TimedOut`] if no reply is in by `expiration`.
    pub fn replied(msg: MessageId, expiration: SimTime) -> Self {
        Condition::new(move |ctx| {
            if ctx.world.reply(msg).is_some() {
                Ok(true)
            } else if ctx.now >= expiration {
                Err(AgentError::TimedOut(format!("no reply to {msg} by {expiration}")))
            } else {
                Ok(false)
            }
        })
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

// ── Closure agents ────────────────────────────────────────────────────────────

/// An agent whose whole behavior is one closure.
pub struct FnAgent<F>(F);

/// Wrap a closure as an [`Agent`].
///
/// ```rust
/// use sn_agent::{from_fn, Step};
///
/// let _ticker = from_fn(|ctx| {
///     let n = ctx.get("ticks").and_then(|v| v.as_i64()).unwrap_or(0);
///     ctx.set("ticks", n + 1);
///     Ok(Step::after(1.0))
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnAgent<F>
where
    F: FnMut(&mut AgentContext<'_>) -> AgentResult<Step> + 'static,
{
    FnAgent(f)
}

impl<F> Agent for FnAgent<F>
where
    F: FnMut(&mut AgentContext<'_>) -> AgentResult<Step> + 'static,
{
    fn activate(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Step> {
        (self.0)(ctx)
    }
}
