//! Shared simulation state: globals, the population, and the topology.
//!
//! The world holds the *public* half of every agent ([`AgentRecord`]).  The
//! private half (behavior and locals) lives in the scheduler, so nothing an
//! agent can reach through its context lets it reschedule someone else.

use sn_core::{AgentId, NodeId, SimTime, State, Value};
use sn_graph::{Graph, Topology};

use crate::{AgentError, AgentResult, Mailbox, Message, MessageId, MessageKind};

#[cfg(feature = "fx-hash")]
type NodeIndex = rustc_hash::FxHashMap<NodeId, AgentId>;
#[cfg(not(feature = "fx-hash"))]
type NodeIndex = std::collections::HashMap<NodeId, AgentId>;

#[cfg(feature = "fx-hash")]
type ReplyIndex = rustc_hash::FxHashMap<MessageId, Value>;
#[cfg(not(feature = "fx-hash"))]
type ReplyIndex = std::collections::HashMap<MessageId, Value>;

/// Attribute key holding an FSM agent's current state name.
pub const STATE_ID: &str = "state_id";

/// The publicly visible part of one agent.
#[derive(Clone, Debug)]
pub struct AgentRecord {
    pub id:    AgentId,
    /// Name of the [`AgentKind`](crate::AgentKind) that produced this agent.
    pub kind:  String,
    pub alive: bool,
    /// Topology node this agent is bound to, if any.
    pub node:  Option<NodeId>,
    pub attrs: State,
}

impl AgentRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Current FSM state name, if the agent has one.
    pub fn state_id(&self) -> Option<&str> {
        self.attrs.get(STATE_ID).and_then(Value::as_str)
    }

    pub fn in_state(&self, state: &str) -> bool {
        self.state_id() == Some(state)
    }
}

/// Everything shared by all agents of one model run.
#[derive(Debug, Default)]
pub struct World {
    /// Model-level environment variables.
    pub globals: State,
    topology:    Graph,
    agents:      Vec<AgentRecord>,
    by_node:     NodeIndex,
    /// Indexed by `AgentId`, like `agents`.
    mailboxes:   Vec<Mailbox>,
    replies:     ReplyIndex,
    next_msg:    u64,
}

impl World {
    pub fn new(topology: Graph) -> Self {
        World { topology, ..Self::default() }
    }

    // ── Globals ───────────────────────────────────────────────────────────

    pub fn global(&self, key: &str) -> Option<&Value> {
        self.globals.get(key)
    }

    pub fn set_global(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(key.into(), value.into());
    }

    // ── Topology ──────────────────────────────────────────────────────────

    pub fn topology(&self) -> &Graph {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Graph {
        &mut self.topology
    }

    // ── Population ────────────────────────────────────────────────────────

    /// Add a new agent record and return its id.  Ids are dense and never
    /// reused.
    ///
    /// Fails if `node` is not part of the topology or is already bound to a
    /// live agent.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        node: Option<NodeId>,
        attrs: State,
    ) -> AgentResult<AgentId> {
        let id = AgentId(self.agents.len() as u32);
        if let Some(node) = node {
            if !self.topology.contains(node) {
                return Err(sn_graph::GraphError::NodeNotFound(node).into());
            }
            if let Some(&by) = self.by_node.get(&node) {
                return Err(AgentError::NodeOccupied { node, by });
            }
            self.by_node.insert(node, id);
        }
        self.agents.push(AgentRecord { id, kind: kind.into(), alive: true, node, attrs });
        self.mailboxes.push(Mailbox::default());
        Ok(id)
    }

    /// Mark `id` dead, release its node, and drop its unread mail.
    /// Idempotent.
    pub fn retire(&mut self, id: AgentId) {
        let Some(record) = self.agents.get_mut(id.index()) else { return };
        record.alive = false;
        if let Some(node) = record.node {
            if self.by_node.get(&node) == Some(&id) {
                self.by_node.remove(&node);
            }
        }
        if let Some(mailbox) = self.mailboxes.get_mut(id.index()) {
            mailbox.clear();
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentRecord> {
        self.agents.get(id.index())
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentRecord> {
        self.agents.get_mut(id.index())
    }

    /// Every agent ever registered, dead ones included, in id order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentRecord> + '_ {
        self.agents.iter()
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &AgentRecord> + '_ {
        self.agents.iter().filter(|r| r.alive)
    }

    /// Total agents ever registered.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn alive_count(&self) -> usize {
        self.alive_agents().count()
    }

    /// The live agent bound to `node`, if any.
    pub fn agent_at(&self, node: NodeId) -> Option<AgentId> {
        self.by_node.get(&node).copied()
    }

    /// Live agents on nodes adjacent to `id`'s node, ordered by node id.
    ///
    /// Agents without a node have no neighbors.
    pub fn neighbors_of(&self, id: AgentId) -> Vec<AgentId> {
        let Some(node) = self.agent(id).and_then(|r| r.node) else {
            return Vec::new();
        };
        self.topology
            .neighbors(node)
            .filter_map(|n| self.agent_at(n))
            .collect()
    }

    // ── Messages ──────────────────────────────────────────────────────────

    pub fn mailbox(&self, id: AgentId) -> Option<&Mailbox> {
        self.mailboxes.get(id.index())
    }

    /// Deliver a message to the live agent `to`.
    pub fn post(
        &mut self,
        to: AgentId,
        kind: MessageKind,
        sender: Option<AgentId>,
        payload: impl Into<Value>,
        now: SimTime,
        expiration: SimTime,
    ) -> AgentResult<MessageId> {
        if !self.agent(to).is_some_and(|r| r.alive) {
            return Err(AgentError::AgentNotFound(to));
        }
        let mailbox = self
            .mailboxes
            .get_mut(to.index())
            .ok_or(AgentError::AgentNotFound(to))?;
        let id = MessageId(self.next_msg);
        self.next_msg += 1;
        mailbox.push(Message { id, kind, sender, payload: payload.into(), sent_at: now, expiration });
        Ok(id)
    }

    /// Take `id`'s oldest unexpired message.
    pub fn take_message(&mut self, id: AgentId, now: SimTime) -> Option<Message> {
        self.mailboxes.get_mut(id.index())?.pop(now)
    }

    pub fn set_reply(&mut self, msg: MessageId, value: impl Into<Value>) {
        self.replies.insert(msg, value.into());
    }

    pub fn reply(&self, msg: MessageId) -> Option<&Value> {
        self.replies.get(&msg)
    }

    pub fn take_reply(&mut self, msg: MessageId) -> Option<Value> {
        self.replies.remove(&msg)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Number of live agents currently in FSM state `state`.
    pub fn count_in_state(&self, state: &str) -> usize {
        self.alive_agents().filter(|r| r.in_state(state)).count()
    }

    /// Number of live neighbors of `id` currently in `state`.
    pub fn count_neighbors_in_state(&self, id: AgentId, state: &str) -> usize {
        self.neighbors_of(id)
            .into_iter()
            .filter_map(|n| self.agent(n))
            .filter(|r| r.in_state(state))
            .count()
    }
}
