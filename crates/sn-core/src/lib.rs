//! `sn-core` — foundational types for the `rust_sn` social-network simulator.
//!
//! This crate is a dependency of every other `sn-*` crate.  It has no `sn-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `NodeId`                                   |
//! | [`time`]        | `SimTime` (with `NEVER` / `NOW` sentinels)            |
//! | [`value`]       | `Value`, `State` (open key → value maps)              |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (per-model)          |
//! | [`config`]      | `SimConfig`, `PopulationSpec`                         |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by the CLI to load run configuration files.       |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod value;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{PopulationSpec, SimConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, NodeId};
pub use rng::{AgentRng, SimRng};
pub use time::SimTime;
pub use value::{State, Value};
