//! Standard topology generators.
//!
//! Node ids are always `0..n`.  Random generators draw from the model-level
//! [`SimRng`] so a topology is reproducible from the trial seed.

use sn_core::{NodeId, SimRng};

use crate::Graph;

/// Every pair of nodes connected.
pub fn complete(n: usize) -> Graph {
    let mut g = Graph::with_nodes(n);
    for a in 0..n as u32 {
        for b in (a + 1)..n as u32 {
            connect(&mut g, NodeId(a), NodeId(b));
        }
    }
    g
}

/// A line `0 — 1 — … — n-1`.
pub fn path(n: usize) -> Graph {
    let mut g = Graph::with_nodes(n);
    for a in 1..n as u32 {
        connect(&mut g, NodeId(a - 1), NodeId(a));
    }
    g
}

/// Node 0 connected to every other node.
pub fn star(n: usize) -> Graph {
    let mut g = Graph::with_nodes(n);
    for a in 1..n as u32 {
        connect(&mut g, NodeId(0), NodeId(a));
    }
    g
}

/// G(n, p): each of the `n(n-1)/2` possible edges is present with
/// probability `p`, independently.  Pairs are visited in ascending order.
pub fn erdos_renyi(n: usize, p: f64, rng: &mut SimRng) -> Graph {
    let mut g = Graph::with_nodes(n);
    for a in 0..n as u32 {
        for b in (a + 1)..n as u32 {
            if rng.prob(p) {
                connect(&mut g, NodeId(a), NodeId(b));
            }
        }
    }
    g
}

// Generator node ids are always in range and distinct.
fn connect(g: &mut Graph, a: NodeId, b: NodeId) {
    let _ = g.add_edge(a, b);
}
