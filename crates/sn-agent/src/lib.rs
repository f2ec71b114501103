//! `sn-agent` — what an agent is, and what it may touch while it runs.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                         |
//! |-------------|------------------------------------------------------------------|
//! | [`agent`]   | `Agent` trait, `Step`, `Wakeup`, `Condition`, `from_fn`          |
//! | [`world`]   | `World` (globals, population, topology), `AgentRecord`           |
//! | [`context`] | `AgentContext<'a>`, `ConditionContext<'a>`, `SpawnRequest`       |
//! | [`process`] | `Process` trait, `Resume`, `Yielded`, `ProcessAgent`             |
//! | [`script`]  | `Script<L>` — staged process with explicit program counter       |
//! | [`fsm`]     | `StateTable<A>`, `Fsm<A>`, `Transition`, suspendable states      |
//! | [`kind`]    | `AgentKind` — shareable factory for one agent type               |
//! | [`message`] | `Message`, `MessageId`, `Mailbox` — agent-to-agent messages      |
//! | [`error`]   | `AgentError`, `AgentResult<T>`                                   |
//!
//! # Design notes
//!
//! An agent is split in two halves:
//!
//! 1. **Behavior** (`Box<dyn Agent>`): private logic and locals, including the
//!    resumable cursor of a suspended process.  Only the scheduler calls it.
//! 2. **Record** ([`AgentRecord`]): the public attribute map other agents,
//!    conditions, and reporters read.  Lives in the [`World`].
//!
//! During an activation the behavior is borrowed out of the scheduler and
//! handed an [`AgentContext`] with `&mut World`, so it can read and nudge
//! other agents' public state without ever touching their scheduling
//! bookkeeping.  Activations are serialised; there is no locking.

pub mod agent;
pub mod context;
pub mod error;
pub mod fsm;
pub mod kind;
pub mod message;
pub mod process;
pub mod script;
pub mod world;

#[cfg(test)]
mod tests;

pub use agent::{from_fn, Agent, Condition, FnAgent, Step, Wakeup};
pub use context::{AgentContext, ConditionContext, SpawnRequest};
pub use error::{AgentError, AgentResult};
pub use fsm::{Fsm, FsmBuilder, Handler, StateHandler, StateProcess, StateTable, Transition};
pub use kind::AgentKind;
pub use message::{Mailbox, Message, MessageId, MessageKind};
pub use process::{Process, ProcessAgent, Resume, Yielded};
pub use script::{Flow, Script};
pub use world::{AgentRecord, World, STATE_ID};
