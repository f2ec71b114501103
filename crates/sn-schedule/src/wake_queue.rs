//! `WakeQueue` — agents bucketed by their next wakeup time.
//!
//! # Why this exists
//!
//! Most agents are asleep most of the time.  Iterating all N agents every tick
//! to check "is it my turn?" would cost O(N) per tick regardless of how many
//! agents actually run.
//!
//! `WakeQueue` inverts the problem: after an activation each agent registers
//! the instant it needs attention next, and each tick drains only the earliest
//! bucket.  Buckets are `BTreeSet`s, so a drained bucket comes out in
//! ascending `AgentId` order, the scheduler's deterministic tie-break.
//!
//! # Invariant
//!
//! Every agent appears in at most one bucket.  A second `push` for an agent
//! that is still queued is refused with [`ScheduleError::AlreadyScheduled`];
//! the scheduler treats that as a corrupted schedule.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sn_core::{AgentId, SimTime};

use crate::{ScheduleError, ScheduleResult};

/// A time-ordered multi-map from wakeup time to the agents due then.
#[derive(Default, Debug)]
pub struct WakeQueue {
    buckets: BTreeMap<SimTime, BTreeSet<AgentId>>,
    /// Reverse index: where each queued agent currently sits.
    slots:   HashMap<AgentId, SimTime>,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `agent` to wake at `time`.
    pub fn push(&mut self, time: SimTime, agent: AgentId) -> ScheduleResult<()> {
        if let Some(&at) = self.slots.get(&agent) {
            return Err(ScheduleError::AlreadyScheduled { agent, at });
        }
        self.slots.insert(agent, time);
        self.buckets.entry(time).or_default().insert(agent);
        Ok(())
    }

    /// Take `agent` out of whatever bucket it is in, returning that bucket's time.
    pub fn remove(&mut self, agent: AgentId) -> Option<SimTime> {
        let time = self.slots.remove(&agent)?;
        if let Some(bucket) = self.buckets.get_mut(&time) {
            bucket.remove(&agent);
            if bucket.is_empty() {
                self.buckets.remove(&time);
            }
        }
        Some(time)
    }

    /// Remove and return all agents scheduled for exactly `time`, ascending by id.
    pub fn drain_at(&mut self, time: SimTime) -> Vec<AgentId> {
        let Some(bucket) = self.buckets.remove(&time) else {
            return Vec::new();
        };
        for agent in &bucket {
            self.slots.remove(agent);
        }
        bucket.into_iter().collect()
    }

    /// The earliest time with at least one queued agent, or `None` if empty.
    pub fn next_time(&self) -> Option<SimTime> {
        self.buckets.keys().next().copied()
    }

    /// The bucket `agent` currently sits in.
    pub fn scheduled_at(&self, agent: AgentId) -> Option<SimTime> {
        self.slots.get(&agent).copied()
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.slots.contains_key(&agent)
    }

    /// Total number of queued agents.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of distinct future times that have at least one queued agent.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Cross-check the bucket map against the reverse index.
    ///
    /// Returns a description of the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut seen = 0usize;
        for (time, bucket) in &self.buckets {
            if bucket.is_empty() {
                return Err(format!("empty bucket left at {time}"));
            }
            for agent in bucket {
                match self.slots.get(agent) {
                    Some(at) if at == time => seen += 1,
                    Some(at) => {
                        return Err(format!("{agent} found in bucket {time} but indexed at {at}"));
                    }
                    None => return Err(format!("{agent} found in bucket {time} but not indexed")),
                }
            }
        }
        if seen != self.slots.len() {
            return Err(format!(
                "{} agents indexed but {seen} found in buckets",
                self.slots.len()
            ));
        }
        Ok(())
    }
}
