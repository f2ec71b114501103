//! Kind-name → [`AgentKind`] lookup used to build populations from config.

use std::collections::BTreeMap;

use sn_agent::AgentKind;

use crate::{SimError, SimResult};

/// Maps kind names to factories.  `Send + Sync`, so one registry can feed
/// every trial of a parallel run.
#[derive(Clone, Debug, Default)]
pub struct KindRegistry {
    kinds: BTreeMap<String, AgentKind>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind` under its own name, replacing any previous entry.
    pub fn register(&mut self, kind: AgentKind) -> &mut Self {
        self.kinds.insert(kind.name().to_owned(), kind);
        self
    }

    pub fn with(mut self, kind: AgentKind) -> Self {
        self.register(kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AgentKind> {
        self.kinds.get(name)
    }

    pub fn resolve(&self, name: &str) -> SimResult<&AgentKind> {
        self.get(name).ok_or_else(|| SimError::UnknownKind(name.to_owned()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.kinds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
