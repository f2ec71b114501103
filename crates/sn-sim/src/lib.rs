//! `sn-sim` — scheduler, model, and run loop for the rust_sn simulator.
//!
//! # Tick loop
//!
//! ```text
//! while !limit_reached:
//!   ① pick t*      — earliest wakeup (pending agents force t* ≤ now + Δ)
//!   ② due set      — bucket t* plus pending agents whose predicate holds;
//!                    closed at tick start
//!   ③ activations  — ascending AgentId; each returns a Step or an error
//!   ④ reschedule   — resolve the wakeup; bucket, pending set, or death
//!   ⑤ observers    — on_agent_error per failure, collect, on_tick_end
//! ```
//!
//! Per-agent errors kill only that agent and are reported.  Only a corrupted
//! schedule ([`SimError::SchedulerInvariant`]) stops the run.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | [`run_trials`] runs trials on Rayon's thread pool.     |
//! | `fx-hash`  | FxHash for the world's node → agent index.             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sn_sim::{ModelBuilder, NoopObserver};
//!
//! let mut model = ModelBuilder::new(config)
//!     .topology(graph)
//!     .populate_network(person, 1.0, State::new())
//!     .build()?;
//! let summary = model.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod model;
pub mod observer;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod trials;


pub use builder::ModelBuilder;
pub use error::{SimError, SimResult};
pub use model::{Model, RunSummary};
pub use observer::{NoopObserver, SimObserver};
pub use registry::KindRegistry;
pub use runtime::{AgentFailure, AgentRuntime};
pub use scheduler::{Scheduler, Tick, TickReport};
pub use trials::{run_trials, TrialOutcome};
