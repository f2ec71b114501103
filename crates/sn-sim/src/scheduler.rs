//! The event-driven scheduler.
//!
//! # One tick
//!
//! ```text
//! t* = earliest timed wakeup                     (no pending agents)
//! t* = min(earliest timed wakeup, now + Δ)       (some agents pending)
//!
//!   ① now = t*
//!   ② due = drain bucket t*  ∪  pending agents whose predicate holds at t*
//!          (the set is closed here; nothing added later runs this tick)
//!   ③ for id in due, ascending:
//!        activate / resume → Step
//!        Die            → kill
//!        Wake(spec)     → resolve → bucket | pending set
//!                         (InvalidDelay → now + Δ, report)
//!        Err(e)         → kill, report
//!        spawn requests → register, schedule at now (next tick)
//! ```
//!
//! Pending agents are polled at least every Δ even when no timed agent is
//! due, so a lone agent waiting on a condition never starves.

use sn_agent::{Agent, AgentContext, AgentError, Condition, ConditionContext, SpawnRequest, Step, World};
use sn_core::{AgentId, NodeId, SimTime, State};
use sn_schedule::{resolve, PendingSet, Poll, Resolved, WakeQueue};

use crate::{AgentFailure, AgentRuntime, SimError, SimResult};

/// What one call to [`Scheduler::step`] did.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// 1-based tick counter.
    pub step:      u64,
    pub time:      SimTime,
    /// Activated agents, in activation order.
    pub activated: Vec<AgentId>,
    pub failures:  Vec<AgentFailure>,
    /// Agents created during this tick; they first run next tick.
    pub spawned:   Vec<AgentId>,
}

/// Result of [`Scheduler::step`].
#[derive(Debug)]
pub enum Tick {
    /// No alive agent will ever run again.
    Complete,
    Advanced(TickReport),
}

pub struct Scheduler {
    now:        SimTime,
    interval:   f64,
    trial_seed: u64,
    queue:      WakeQueue,
    pending:    PendingSet<Condition>,
    runtimes:   Vec<AgentRuntime>,
    steps:      u64,
}

impl Scheduler {
    /// `interval` is the default wakeup interval Δ; `trial_seed` seeds every
    /// agent's RNG.
    pub fn new(interval: f64, trial_seed: u64) -> Self {
        Scheduler {
            now: SimTime::ZERO,
            interval,
            trial_seed,
            queue: WakeQueue::new(),
            pending: PendingSet::new(),
            runtimes: Vec::new(),
            steps: 0,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Ticks executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn runtime(&self, id: AgentId) -> Option<&AgentRuntime> {
        self.runtimes.get(id.index())
    }

    pub fn runtimes(&self) -> &[AgentRuntime] {
        &self.runtimes
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.runtime(id).is_some_and(|rt| rt.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.runtimes.iter().filter(|rt| rt.alive).count()
    }

    /// Agents currently waiting on a condition.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Agents currently in a time bucket (including `NEVER`).
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// The time the next tick would run at, or `None` if the run is over.
    ///
    /// Agents parked at `NEVER` are alive but will never be due, so they do
    /// not keep the run going on their own.
    pub fn next_time(&self) -> Option<SimTime> {
        let timed = self.queue.next_time().filter(|t| !t.is_never());
        if self.pending.is_empty() {
            return timed;
        }
        let poll = self.now + self.interval;
        Some(timed.map_or(poll, |t| t.min(poll)))
    }

    // ── Population ────────────────────────────────────────────────────────

    /// Register a new agent and schedule its first activation at `now`.
    ///
    /// Called between ticks this makes the agent due on the next tick at the
    /// current time; called for a spawn, it lands in the bucket that was
    /// just drained, so the agent runs on the following tick.
    pub fn add_agent(
        &mut self,
        world: &mut World,
        kind: &str,
        behavior: Box<dyn Agent>,
        node: Option<NodeId>,
        attrs: State,
    ) -> SimResult<AgentId> {
        if world.agent_count() != self.runtimes.len() {
            return Err(SimError::invariant(format!(
                "world holds {} agents but the scheduler tracks {}",
                world.agent_count(),
                self.runtimes.len()
            )));
        }
        let id = world.register(kind, node, attrs)?;
        self.runtimes.push(AgentRuntime::new(id, behavior, self.trial_seed));
        self.schedule_at(id, self.now)?;
        Ok(id)
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Run one tick.  Only a corrupted schedule is an `Err`; agent failures
    /// are listed in the report.
    pub fn step(&mut self, world: &mut World) -> SimResult<Tick> {
        let Some(time) = self.next_time() else {
            return Ok(Tick::Complete);
        };
        if time < self.now {
            return Err(SimError::invariant(format!(
                "next tick at {time} is before current time {}",
                self.now
            )));
        }
        self.now = time;
        self.steps += 1;

        let mut report = TickReport { step: self.steps, time, ..TickReport::default() };
        let due = self.collect_due(world, &mut report)?;
        tracing::debug!(step = self.steps, %time, due = due.len(), pending = self.pending.len(), "tick");

        for id in due {
            self.activate(world, id, &mut report)?;
        }

        #[cfg(debug_assertions)]
        self.check_invariants(world)?;

        Ok(Tick::Advanced(report))
    }

    /// Drain the bucket at `now` and poll the pending set.  Returns the
    /// sorted, de-duplicated activation set for this tick.
    fn collect_due(&mut self, world: &mut World, report: &mut TickReport) -> SimResult<Vec<AgentId>> {
        let now = self.now;
        let mut due = self.queue.drain_at(now);

        let view: &World = world;
        let polled = self.pending.poll(|agent, cond| {
            cond.check(&ConditionContext { agent, now, world: view })
        });
        for (agent, poll) in polled {
            match poll {
                Poll::Ready => due.push(agent),
                Poll::Failed(err) => self.fail(world, agent, &err, report),
            }
        }

        due.sort_unstable();
        let len = due.len();
        due.dedup();
        if due.len() != len {
            return Err(SimError::invariant(format!(
                "an agent was both queued and pending at {now}"
            )));
        }
        Ok(due)
    }

    fn activate(&mut self, world: &mut World, id: AgentId, report: &mut TickReport) -> SimResult<()> {
        let now = self.now;
        let interval = self.interval;
        let rt = self
            .runtimes
            .get_mut(id.index())
            .ok_or_else(|| SimError::invariant(format!("{id} is scheduled but has no runtime")))?;
        if !rt.alive {
            return Err(SimError::invariant(format!("dead agent {id} was scheduled")));
        }
        let mut behavior = rt
            .behavior
            .take()
            .ok_or_else(|| SimError::invariant(format!("{id} is already being activated")))?;

        let mut spawned: Vec<SpawnRequest> = Vec::new();
        let outcome = {
            let mut ctx = AgentContext::new(id, now, interval, world, &mut rt.rng, &mut spawned);
            behavior.activate(&mut ctx)
        };
        rt.behavior = Some(behavior);
        report.activated.push(id);
        tracing::trace!(agent = %id, %now, "activated");

        match outcome {
            Ok(Step::Die) => {
                tracing::debug!(agent = %id, %now, "agent died");
                self.kill(world, id);
            }
            Ok(Step::Wake(spec)) => match resolve(spec, now, interval) {
                Ok(Resolved::At(at)) => self.schedule_at(id, at)?,
                Ok(Resolved::Pending(cond)) => self.park(id, cond)?,
                Err(err) => {
                    // Fall back to the default cadence so time still advances.
                    self.schedule_at(id, now + interval)?;
                    let err = AgentError::from(err);
                    tracing::warn!(agent = %id, %now, error = %err, "wakeup rejected");
                    report.failures.push(AgentFailure::new(id, now, &err, false));
                }
            },
            Err(err) => self.fail(world, id, &err, report),
        }

        for request in spawned {
            let SpawnRequest { kind, agent, attrs, node } = request;
            match self.add_agent(world, &kind, agent, node, attrs) {
                Ok(child) => {
                    tracing::debug!(parent = %id, %child, kind = %kind, "spawned");
                    report.spawned.push(child);
                }
                Err(SimError::Population(err)) => {
                    tracing::warn!(agent = %id, %now, error = %err, "spawn rejected");
                    report.failures.push(AgentFailure::new(id, now, &err, false));
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    // ── Bookkeeping ───────────────────────────────────────────────────────

    fn schedule_at(&mut self, id: AgentId, at: SimTime) -> SimResult<()> {
        self.queue
            .push(at, id)
            .map_err(|e| SimError::invariant(e.to_string()))?;
        if let Some(rt) = self.runtimes.get_mut(id.index()) {
            rt.next_wakeup = at;
        }
        Ok(())
    }

    fn park(&mut self, id: AgentId, cond: Condition) -> SimResult<()> {
        self.pending
            .insert(id, cond)
            .map_err(|e| SimError::invariant(e.to_string()))?;
        if let Some(rt) = self.runtimes.get_mut(id.index()) {
            rt.next_wakeup = SimTime::NEVER;
        }
        Ok(())
    }

    fn fail(&mut self, world: &mut World, id: AgentId, err: &AgentError, report: &mut TickReport) {
        tracing::warn!(agent = %id, now = %self.now, kind = err.label(), error = %err, "agent failed");
        report.failures.push(AgentFailure::new(id, self.now, err, true));
        self.kill(world, id);
    }

    /// Remove `id` from every scheduling structure.  Idempotent.
    fn kill(&mut self, world: &mut World, id: AgentId) {
        self.queue.remove(id);
        self.pending.remove(id);
        if let Some(rt) = self.runtimes.get_mut(id.index()) {
            rt.alive = false;
            rt.next_wakeup = SimTime::NEVER;
            rt.behavior = None;
        }
        world.retire(id);
    }

    /// Cross-check runtimes, wake queue, pending set, and world.
    pub fn check_invariants(&self, world: &World) -> SimResult<()> {
        self.queue.check_consistency().map_err(SimError::invariant)?;
        for rt in &self.runtimes {
            let queued = self.queue.scheduled_at(rt.id);
            let pending = self.pending.contains(rt.id);
            let record_alive = world.agent(rt.id).is_some_and(|r| r.alive);
            let ok = match (rt.alive, queued, pending) {
                (true, Some(at), false) => at == rt.next_wakeup && at >= self.now,
                (true, None, true) => rt.next_wakeup.is_never(),
                (false, None, false) => rt.next_wakeup.is_never(),
                _ => false,
            };
            if !ok || record_alive != rt.alive {
                return Err(SimError::invariant(format!(
                    "{} is inconsistent: alive={} queued={queued:?} pending={pending} record_alive={record_alive}",
                    rt.id, rt.alive
                )));
            }
        }
        Ok(())
    }
}
