//! `sn-schedule` — the data structures behind the event-driven scheduler.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`wakeup`]     | `WakeupSpec<C>`, `Resolved<C>`, `resolve`                  |
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<SimTime, BTreeSet<AgentId>>`)       |
//! | [`pending`]    | `PendingSet<C>`, `Poll<E>` — agents waiting on a condition |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                       |
//!
//! # Wakeup model (summary)
//!
//! After every activation an agent states when it wants to run next:
//!
//! ```text
//! At(t)        → next = max(t, now)
//! After(d)     → next = now + d            (d < 0 is InvalidDelay)
//! WhenTrue(c)  → parked in the PendingSet, polled every tick
//! Default      → next = now + Δ
//! ```
//!
//! The condition type `C` is generic so this crate does not depend on the
//! agent/world types the predicates inspect.

pub mod error;
pub mod pending;
pub mod wake_queue;
pub mod wakeup;


pub use error::{ScheduleError, ScheduleResult};
pub use pending::{PendingSet, Poll};
pub use wake_queue::WakeQueue;
pub use wakeup::{resolve, Resolved, WakeupSpec};
