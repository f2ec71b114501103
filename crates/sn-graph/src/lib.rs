//! `sn-graph` — the topology agents live on.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`graph`]      | `Topology` trait, `Graph`, `GraphBuilder`                  |
//! | [`generators`] | `complete`, `path`, `star`, `erdos_renyi`                  |
//! | [`error`]      | `GraphError`, `GraphResult<T>`                             |
//!
//! The simulator only needs the capability set in [`Topology`]: enumerate
//! nodes, look up neighbors, and read/write node and edge attributes.

pub mod error;
pub mod generators;
pub mod graph;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphResult};
pub use graph::{Graph, GraphBuilder, Topology};
