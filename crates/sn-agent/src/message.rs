//! Agent-to-agent messages.
//!
//! Every agent owns a [`Mailbox`] in the [`World`](crate::World).  Senders
//! push into it through [`AgentContext::tell`](crate::AgentContext::tell)
//! and [`AgentContext::ask`](crate::AgentContext::ask); the receiver drains
//! it on its own activations.  Waiting for mail is an ordinary
//! [`Condition`](crate::Condition), so a receiver can park until something
//! arrives instead of polling.

use std::collections::VecDeque;
use std::fmt;

use sn_core::{AgentId, SimTime, Value};

/// Model-wide message sequence number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg#{}", self.0)
    }
}

/// Whether the sender expects an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Tell,
    /// Answer with [`AgentContext::reply`](crate::AgentContext::reply).
    Ask,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id:         MessageId,
    pub kind:       MessageKind,
    /// `None` when posted from outside the population.
    pub sender:     Option<AgentId>,
    pub payload:    Value,
    pub sent_at:    SimTime,
    /// Dropped unread once `now` is past this.
    pub expiration: SimTime,
}

impl Message {
    pub fn is_expired(&self, now: SimTime) -> bool {
        self.expiration < now
    }

    pub fn is_ask(&self) -> bool {
        self.kind == MessageKind::Ask
    }
}

/// One agent's inbox.
#[derive(Clone, Debug, Default)]
pub struct Mailbox {
    queue:     VecDeque<Message>,
    received:  u64,
    processed: u64,
}

impl Mailbox {
    pub(crate) fn push(&mut self, msg: Message) {
        self.received += 1;
        self.queue.push_back(msg);
    }

    /// Oldest unexpired message.  Expired ones ahead of it are discarded.
    pub(crate) fn pop(&mut self, now: SimTime) -> Option<Message> {
        while let Some(msg) = self.queue.pop_front() {
            self.processed += 1;
            if !msg.is_expired(now) {
                return Some(msg);
            }
        }
        None
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    /// Messages ever delivered here.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Messages taken out, expired ones included.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Messages waiting to be read.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn peek(&self) -> Option<&Message> {
        self.queue.front()
    }
}
