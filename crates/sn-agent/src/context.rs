//! What an agent may see and touch during one activation.

use sn_core::{AgentId, AgentRng, NodeId, SimTime, State, Value};
use sn_graph::Graph;

use sn_schedule::ScheduleError;

use crate::{
    Agent, AgentError, AgentRecord, AgentResult, Condition, Mailbox, Message, MessageId, MessageKind, World,
    STATE_ID,
};

// ── SpawnRequest ──────────────────────────────────────────────────────────────

/// A new agent created mid-run.  The scheduler registers it after the
/// current activation returns and first activates it at the current time.
pub struct SpawnRequest {
    pub kind:  String,
    pub agent: Box<dyn Agent>,
    pub attrs: State,
    pub node:  Option<NodeId>,
}

impl SpawnRequest {
    pub fn new(kind: impl Into<String>, agent: Box<dyn Agent>) -> Self {
        SpawnRequest { kind: kind.into(), agent, attrs: State::new(), node: None }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn on_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }
}

// ── AgentContext ──────────────────────────────────────────────────────────────

/// Handed to [`Agent::activate`].
///
/// The context borrows the world mutably for the duration of one
/// activation.  Agents read and write their own public attributes, read
/// other agents, and may nudge other agents' public attributes; they cannot
/// touch anyone's schedule.
pub struct AgentContext<'a> {
    id:       AgentId,
    now:      SimTime,
    interval: f64,
    world:    &'a mut World,
    rng:      &'a mut AgentRng,
    spawned:  &'a mut Vec<SpawnRequest>,
}

impl<'a> AgentContext<'a> {
    pub fn new(
        id: AgentId,
        now: SimTime,
        interval: f64,
        world: &'a mut World,
        rng: &'a mut AgentRng,
        spawned: &'a mut Vec<SpawnRequest>,
    ) -> Self {
        AgentContext { id, now, interval, world, rng, spawned }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// The model's default wakeup interval Δ.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn rng(&mut self) -> &mut AgentRng {
        &mut *self.rng
    }

    pub fn world(&self) -> &World {
        &*self.world
    }

    // ── Own attributes ────────────────────────────────────────────────────

    fn me(&self) -> Option<&AgentRecord> {
        self.world.agent(self.id)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.me()?.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if let Some(me) = self.world.agent_mut(self.id) {
            me.attrs.insert(key.into(), value.into());
        }
    }

    pub fn state_id(&self) -> Option<&str> {
        self.me()?.state_id()
    }

    pub fn set_state_id(&mut self, state: impl Into<String>) {
        self.set(STATE_ID, state.into());
    }

    pub fn node(&self) -> Option<NodeId> {
        self.me()?.node
    }

    // ── Globals ───────────────────────────────────────────────────────────

    pub fn global(&self, key: &str) -> Option<&Value> {
        self.world.global(key)
    }

    pub fn set_global(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.world.set_global(key, value);
    }

    // ── Other agents ──────────────────────────────────────────────────────

    pub fn agent(&self, id: AgentId) -> Option<&AgentRecord> {
        self.world.agent(id)
    }

    /// Write a public attribute of another (live) agent.
    pub fn nudge(&mut self, id: AgentId, key: impl Into<String>, value: impl Into<Value>) -> AgentResult<()> {
        let record = self
            .world
            .agent_mut(id)
            .filter(|r| r.alive)
            .ok_or(AgentError::AgentNotFound(id))?;
        record.attrs.insert(key.into(), value.into());
        Ok(())
    }

    /// Live agents on adjacent nodes, ordered by node id.
    pub fn neighbors(&self) -> Vec<AgentId> {
        self.world.neighbors_of(self.id)
    }

    pub fn count_neighbors_in_state(&self, state: &str) -> usize {
        self.world.count_neighbors_in_state(self.id, state)
    }

    pub fn count_agents_in_state(&self, state: &str) -> usize {
        self.world.count_in_state(state)
    }

    // ── Topology ──────────────────────────────────────────────────────────

    pub fn topology(&self) -> &Graph {
        self.world.topology()
    }

    pub fn topology_mut(&mut self) -> &mut Graph {
        self.world.topology_mut()
    }

    // ── Messages ──────────────────────────────────────────────────────────

    /// `now + timeout`, or `NEVER` without one.
    fn expiration(&self, timeout: Option<f64>) -> AgentResult<SimTime> {
        match timeout {
            None => Ok(SimTime::NEVER),
            Some(t) if t >= 0.0 => Ok(self.now + t),
            Some(t) => Err(ScheduleError::InvalidDelay(t).into()),
        }
    }

    /// Send `payload` to the live agent `to`.
    pub fn tell(&mut self, to: AgentId, payload: impl Into<Value>) -> AgentResult<MessageId> {
        self.world
            .post(to, MessageKind::Tell, Some(self.id), payload, self.now, SimTime::NEVER)
    }

    /// Send `payload` to every live neighbor; returns how many were reached.
    pub fn tell_neighbors(&mut self, payload: impl Into<Value>) -> AgentResult<usize> {
        let payload = payload.into();
        let neighbors = self.neighbors();
        for &n in &neighbors {
            self.tell(n, payload.clone())?;
        }
        Ok(neighbors.len())
    }

    /// Send a question to `to` and get back its id and a condition that
    /// holds once it is answered.  The question expires unanswered after
    /// `timeout`, and the condition then fails with `TimedOut`.
    pub fn ask(
        &mut self,
        to: AgentId,
        payload: impl Into<Value>,
        timeout: Option<f64>,
    ) -> AgentResult<(MessageId, Condition)> {
        let expiration = self.expiration(timeout)?;
        let msg = self
            .world
            .post(to, MessageKind::Ask, Some(self.id), payload, self.now, expiration)?;
        Ok((msg, Condition::replied(msg, expiration)))
    }

    /// A condition that holds once a message arrives after this call, and
    /// fails with `TimedOut` if none has by `now + timeout`.
    pub fn received(&self, timeout: Option<f64>) -> AgentResult<Condition> {
        let expiration = self.expiration(timeout)?;
        let seen = self.mailbox().map_or(0, Mailbox::received);
        Ok(Condition::message_received(seen, expiration))
    }

    pub fn mailbox(&self) -> Option<&Mailbox> {
        self.world.mailbox(self.id)
    }

    /// Take the oldest unexpired message from the own mailbox.
    pub fn receive(&mut self) -> Option<Message> {
        self.world.take_message(self.id, self.now)
    }

    /// Answer an ask.
    pub fn reply(&mut self, msg: &Message, value: impl Into<Value>) -> AgentResult<()> {
        if !msg.is_ask() {
            return Err(AgentError::failed(format!("{} is not a question", msg.id)));
        }
        self.world.set_reply(msg.id, value);
        Ok(())
    }

    /// The answer to one of this agent's asks, once.
    pub fn take_reply(&mut self, msg: MessageId) -> Option<Value> {
        self.world.take_reply(msg)
    }

    // ── Population changes ────────────────────────────────────────────────

    pub fn spawn(&mut self, request: SpawnRequest) {
        self.spawned.push(request);
    }
}

// ── ConditionContext ──────────────────────────────────────────────────────────

/// Read-only view handed to a [`Condition`](crate::Condition) while it is
/// polled.
pub struct ConditionContext<'a> {
    pub agent: AgentId,
    pub now:   SimTime,
    pub world: &'a World,
}

impl ConditionContext<'_> {
    /// The waiting agent's own attribute.
    pub fn own(&self, key: &str) -> Option<&Value> {
        self.world.agent(self.agent)?.get(key)
    }

    /// The waiting agent's mailbox.
    pub fn mailbox(&self) -> Option<&Mailbox> {
        self.world.mailbox(self.agent)
    }
}
