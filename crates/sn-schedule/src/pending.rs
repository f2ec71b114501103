//! Agents parked on a condition instead of a time.

use std::collections::BTreeMap;

use sn_core::AgentId;

use crate::{ScheduleError, ScheduleResult};

/// Result of polling one pending agent.
#[derive(Debug, PartialEq)]
pub enum Poll<E> {
    /// The predicate held; the agent should be activated.
    Ready,
    /// The predicate failed; the agent should be killed.
    Failed(E),
}

/// The pending-condition set, keyed (and therefore polled) by ascending id.
pub struct PendingSet<C> {
    inner: BTreeMap<AgentId, C>,
}

impl<C> Default for PendingSet<C> {
    fn default() -> Self {
        Self { inner: BTreeMap::new() }
    }
}

impl<C> PendingSet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent: AgentId, condition: C) -> ScheduleResult<()> {
        if self.inner.contains_key(&agent) {
            return Err(ScheduleError::AlreadyPending(agent));
        }
        self.inner.insert(agent, condition);
        Ok(())
    }

    pub fn remove(&mut self, agent: AgentId) -> Option<C> {
        self.inner.remove(&agent)
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.inner.contains_key(&agent)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.inner.keys().copied()
    }

    /// Evaluate every predicate once, in ascending id order.
    ///
    /// Agents whose predicate returns `Ok(true)` or `Err(_)` are removed and
    /// reported; the rest stay parked.
    pub fn poll<E, F>(&mut self, mut check: F) -> Vec<(AgentId, Poll<E>)>
    where
        F: FnMut(AgentId, &mut C) -> Result<bool, E>,
    {
        let mut out = Vec::new();
        self.inner.retain(|&agent, condition| match check(agent, condition) {
            Ok(false) => true,
            Ok(true) => {
                out.push((agent, Poll::Ready));
                false
            }
            Err(e) => {
                out.push((agent, Poll::Failed(e)));
                false
            }
        });
        out
    }
}
