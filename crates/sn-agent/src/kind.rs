//! Named, shareable agent factories.

use std::fmt;
use std::sync::Arc;

use sn_core::{State, Value};

use crate::{Agent, Fsm, SpawnRequest, StateTable, STATE_ID};

type Factory = Arc<dyn Fn() -> Box<dyn Agent> + Send + Sync>;

/// One agent type: a name, default public attributes, and a factory for the
/// private behavior.
///
/// Kinds are `Send + Sync` so one registry can feed trials running on
/// several threads; the agents they produce are not, and never leave the
/// thread that made them.
#[derive(Clone)]
pub struct AgentKind {
    name:     String,
    defaults: State,
    make:     Factory,
}

impl AgentKind {
    pub fn new<F>(name: impl Into<String>, make: F) -> Self
    where
        F: Fn() -> Box<dyn Agent> + Send + Sync + 'static,
    {
        AgentKind { name: name.into(), defaults: State::new(), make: Arc::new(make) }
    }

    /// An FSM kind.  New agents start in the table's default state.
    pub fn fsm<A, D>(name: impl Into<String>, table: Arc<StateTable<A>>, data: D) -> Self
    where
        A: 'static,
        D: Fn() -> A + Send + Sync + 'static,
    {
        let default = table.default_state().to_owned();
        let make = move || Box::new(Fsm::new(Arc::clone(&table), data())) as Box<dyn Agent>;
        AgentKind::new(name, make).with_default(STATE_ID, default)
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &State {
        &self.defaults
    }

    pub fn instantiate(&self) -> Box<dyn Agent> {
        (self.make)()
    }

    /// A spawn request for a fresh agent of this kind.
    pub fn spawn(&self) -> SpawnRequest {
        let mut req = SpawnRequest::new(self.name.clone(), self.instantiate());
        req.attrs = self.defaults.clone();
        req
    }
}

impl fmt::Debug for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentKind")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
