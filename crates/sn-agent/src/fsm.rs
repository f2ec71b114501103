//! Finite-state-machine agents.
//!
//! A [`StateTable`] maps state names to handler functions and names exactly
//! one default state.  The current state is the public attribute
//! [`STATE_ID`], so other agents and reporters see it like any other
//! attribute, and setting it from outside moves the machine.
//!
//! Each activation looks up the handler for the current state, runs it,
//! and applies the [`Transition`] it returns.
//!
//! A state may instead be a [`Process`] that suspends part-way through.
//! The machine keeps its cursor across activations and only applies a
//! transition once the process returns one.  If the state is changed from
//! outside while the process is suspended, the cursor is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use sn_core::SimTime;
use sn_schedule::WakeupSpec;

use crate::{Agent, AgentContext, AgentError, AgentResult, Condition, Process, Resume, Step, Wakeup, STATE_ID};

/// One state's behavior.  `A` is the agent's private data.
pub type Handler<A> = fn(&mut A, &mut AgentContext<'_>) -> AgentResult<Transition>;

/// Starts the body of a suspendable state.
pub type StateProcess = fn() -> Box<dyn Process<Transition>>;

/// How a state runs.
pub enum StateHandler<A> {
    /// Runs to completion on every activation.
    Step(Handler<A>),
    /// Suspends and resumes across activations.
    Process(StateProcess),
}

impl<A> Clone for StateHandler<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for StateHandler<A> {}

// ── Transition ────────────────────────────────────────────────────────────────

/// The outcome of a state handler.
#[derive(Debug, Default)]
pub struct Transition {
    /// State to move to; `None` stays put.
    pub next: Option<String>,
    pub wake: Wakeup,
    pub die:  bool,
}

impl Transition {
    /// Stay in the current state and wake after the default interval.
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn to(state: impl Into<String>) -> Self {
        Transition { next: Some(state.into()), ..Self::default() }
    }

    pub fn die() -> Self {
        Transition { die: true, ..Self::default() }
    }

    pub fn after(mut self, delay: f64) -> Self {
        self.wake = WakeupSpec::After(delay);
        self
    }

    pub fn at(mut self, time: impl Into<SimTime>) -> Self {
        self.wake = WakeupSpec::At(time.into());
        self
    }

    pub fn when(mut self, cond: Condition) -> Self {
        self.wake = WakeupSpec::WhenTrue(cond);
        self
    }

    /// Never wake again unless something else changes the state.
    pub fn never(self) -> Self {
        self.at(SimTime::NEVER)
    }
}

// ── StateTable ────────────────────────────────────────────────────────────────

/// Immutable state → handler table shared by every agent of one kind.
pub struct StateTable<A> {
    handlers: HashMap<String, StateHandler<A>>,
    default:  String,
}

impl<A> StateTable<A> {
    pub fn builder() -> FsmBuilder<A> {
        FsmBuilder { states: Vec::new(), defaults: Vec::new() }
    }

    pub fn default_state(&self) -> &str {
        &self.default
    }

    pub fn contains(&self, state: &str) -> bool {
        self.handlers.contains_key(state)
    }

    pub fn handler(&self, state: &str) -> Option<StateHandler<A>> {
        self.handlers.get(state).copied()
    }

    /// State names, sorted.
    pub fn states(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects states and validates the table once in [`build`](Self::build).
pub struct FsmBuilder<A> {
    states:   Vec<(String, StateHandler<A>)>,
    defaults: Vec<String>,
}

impl<A> FsmBuilder<A> {
    pub fn state(self, name: impl Into<String>, handler: Handler<A>) -> Self {
        self.add(name.into(), StateHandler::Step(handler), false)
    }

    /// Add a state and mark it as the one new agents start in.
    pub fn default_state(self, name: impl Into<String>, handler: Handler<A>) -> Self {
        self.add(name.into(), StateHandler::Step(handler), true)
    }

    /// Add a suspendable state; `start` builds a fresh process each time
    /// the state is (re)entered.
    pub fn process_state(self, name: impl Into<String>, start: StateProcess) -> Self {
        self.add(name.into(), StateHandler::Process(start), false)
    }

    pub fn default_process_state(self, name: impl Into<String>, start: StateProcess) -> Self {
        self.add(name.into(), StateHandler::Process(start), true)
    }

    fn add(mut self, name: String, handler: StateHandler<A>, default: bool) -> Self {
        if default {
            self.defaults.push(name.clone());
        }
        self.states.push((name, handler));
        self
    }

    /// Fails on duplicate state names, on a missing default, and on more
    /// than one default.
    pub fn build(self) -> AgentResult<Arc<StateTable<A>>> {
        let mut defaults = self.defaults.into_iter();
        let default = defaults
            .next()
            .ok_or_else(|| AgentError::Definition("no default state".into()))?;
        if let Some(other) = defaults.next() {
            return Err(AgentError::Definition(format!(
                "multiple default states: `{default}` and `{other}`"
            )));
        }
        let mut handlers = HashMap::with_capacity(self.states.len());
        for (name, handler) in self.states {
            if handlers.insert(name.clone(), handler).is_some() {
                return Err(AgentError::Definition(format!("duplicate state `{name}`")));
            }
        }
        Ok(Arc::new(StateTable { handlers, default }))
    }
}

// ── Fsm ───────────────────────────────────────────────────────────────────────

/// An agent driven by a [`StateTable`].
pub struct Fsm<A> {
    table:  Arc<StateTable<A>>,
    data:   A,
    /// Suspended state body and the state it belongs to.
    cursor: Option<(String, Box<dyn Process<Transition>>)>,
}

impl<A> Fsm<A> {
    pub fn new(table: Arc<StateTable<A>>, data: A) -> Self {
        Fsm { table, data, cursor: None }
    }

    /// State whose process is currently suspended, if any.
    pub fn suspended_in(&self) -> Option<&str> {
        self.cursor.as_ref().map(|(state, _)| state.as_str())
    }

    pub fn data(&self) -> &A {
        &self.data
    }

    pub fn table(&self) -> &StateTable<A> {
        &self.table
    }
}

impl<A: 'static> Agent for Fsm<A> {
    fn activate(&mut self, ctx: &mut AgentContext<'_>) -> AgentResult<Step> {
        let current = match ctx.state_id() {
            Some(s) => s.to_owned(),
            None => {
                let s = self.table.default_state().to_owned();
                ctx.set_state_id(s.clone());
                s
            }
        };
        if self.cursor.as_ref().is_some_and(|(state, _)| *state != current) {
            tracing::trace!(agent = %ctx.id(), now = %ctx.now(), state = %current, "suspended state abandoned");
            self.cursor = None;
        }
        let handler = self
            .table
            .handler(&current)
            .ok_or_else(|| AgentError::UnknownState(current.clone()))?;
        let transition = match handler {
            StateHandler::Step(handler) => handler(&mut self.data, ctx)?,
            StateHandler::Process(start) => {
                let (_, process) = self.cursor.get_or_insert_with(|| (current, start()));
                match process.resume(ctx) {
                    Ok(Resume::Return(transition)) => {
                        self.cursor = None;
                        transition
                    }
                    Ok(Resume::Yield(y)) => {
                        let wake = y.into_wakeup();
                        if wake.is_err() {
                            self.cursor = None;
                        }
                        return wake.map(Step::Wake);
                    }
                    Err(e) => {
                        self.cursor = None;
                        return Err(e);
                    }
                }
            }
        };
        if transition.die {
            return Ok(Step::Die);
        }
        if let Some(next) = transition.next {
            if !self.table.contains(&next) {
                return Err(AgentError::UnknownState(next));
            }
            tracing::trace!(agent = %ctx.id(), now = %ctx.now(), to = %next, "fsm transition");
            ctx.set(STATE_ID, next);
        }
        Ok(Step::Wake(transition.wake))
    }

    fn is_suspended(&self) -> bool {
        self.cursor.is_some()
    }
}
