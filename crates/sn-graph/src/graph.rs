//! Undirected attributed graph and the `Topology` capability trait.
//!
//! # Data layout
//!
//! Nodes are dense indices (`NodeId(i)` is slot `i`).  Adjacency is a
//! `BTreeSet` per node so neighbor iteration is ordered by `NodeId`, which
//! keeps any agent logic that walks its neighbors deterministic.
//!
//! Removing a node leaves a tombstone: the slot stays allocated, its edges are
//! dropped, and `contains` reports `false`.  Ids of other nodes never shift.
//!
//! Edge attributes are keyed by the normalised pair `(min, max)`.

use std::collections::{BTreeMap, BTreeSet};

use sn_core::{NodeId, State, Value};

use crate::{GraphError, GraphResult};

// ── Topology ──────────────────────────────────────────────────────────────────

/// The minimal capability set the model consumes from a topology.
pub trait Topology {
    /// Number of live nodes.
    fn node_count(&self) -> usize;

    /// Number of undirected edges.
    fn edge_count(&self) -> usize;

    /// Live node ids in ascending order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_;

    fn contains(&self, node: NodeId) -> bool;

    /// Neighbors of `node` in ascending order.  Empty for unknown nodes.
    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_;

    fn node_attr(&self, node: NodeId, key: &str) -> Option<&Value>;

    fn set_node_attr(&mut self, node: NodeId, key: &str, value: Value) -> GraphResult<()>;

    fn edge_attr(&self, a: NodeId, b: NodeId, key: &str) -> Option<&Value>;

    fn set_edge_attr(&mut self, a: NodeId, b: NodeId, key: &str, value: Value) -> GraphResult<()>;
}

// ── Graph ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
struct NodeSlot {
    present: bool,
    attrs:   State,
}

/// An undirected graph with per-node and per-edge attribute maps.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes:      Vec<NodeSlot>,
    adjacency:  Vec<BTreeSet<NodeId>>,
    edge_attrs: BTreeMap<(NodeId, NodeId), State>,
    live:       usize,
}

#[inline]
fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Graph {
    /// An empty graph.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A graph with `n` isolated nodes `0..n`.
    pub fn with_nodes(n: usize) -> Self {
        let mut g = Self::empty();
        for _ in 0..n {
            g.add_node();
        }
        g
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Append a node and return its id.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot { present: true, attrs: State::new() });
        self.adjacency.push(BTreeSet::new());
        self.live += 1;
        id
    }

    /// Connect `a` and `b`.  Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> GraphResult<bool> {
        self.check(a)?;
        self.check(b)?;
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        let inserted = self.adjacency[a.index()].insert(b);
        self.adjacency[b.index()].insert(a);
        if inserted {
            self.edge_attrs.insert(edge_key(a, b), State::new());
        }
        Ok(inserted)
    }

    /// Disconnect `a` and `b`.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> GraphResult<()> {
        if !self.has_edge(a, b) {
            return Err(GraphError::EdgeNotFound(a, b));
        }
        self.adjacency[a.index()].remove(&b);
        self.adjacency[b.index()].remove(&a);
        self.edge_attrs.remove(&edge_key(a, b));
        Ok(())
    }

    /// Tombstone `node`: drop its edges and attributes.
    pub fn remove_node(&mut self, node: NodeId) -> GraphResult<()> {
        self.check(node)?;
        let neighbors = std::mem::take(&mut self.adjacency[node.index()]);
        for other in neighbors {
            self.adjacency[other.index()].remove(&node);
            self.edge_attrs.remove(&edge_key(node, other));
        }
        let slot = &mut self.nodes[node.index()];
        slot.present = false;
        slot.attrs.clear();
        self.live -= 1;
        Ok(())
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(a.index())
            .is_some_and(|adj| adj.contains(&b))
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node.index()).map_or(0, BTreeSet::len)
    }

    /// All attributes of `node`.
    pub fn node_attrs(&self, node: NodeId) -> Option<&State> {
        self.nodes
            .get(node.index())
            .filter(|slot| slot.present)
            .map(|slot| &slot.attrs)
    }

    /// Edges as `(a, b)` pairs with `a < b`, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edge_attrs.keys().copied()
    }

    fn check(&self, node: NodeId) -> GraphResult<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(node))
        }
    }
}

impl Topology for Graph {
    fn node_count(&self) -> usize {
        self.live
    }

    fn edge_count(&self) -> usize {
        self.edge_attrs.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.present)
            .map(|(i, _)| NodeId(i as u32))
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.get(node.index()).is_some_and(|slot| slot.present)
    }

    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.get(node.index()).into_iter().flatten().copied()
    }

    fn node_attr(&self, node: NodeId, key: &str) -> Option<&Value> {
        self.node_attrs(node)?.get(key)
    }

    fn set_node_attr(&mut self, node: NodeId, key: &str, value: Value) -> GraphResult<()> {
        self.check(node)?;
        self.nodes[node.index()].attrs.insert(key.to_owned(), value);
        Ok(())
    }

    fn edge_attr(&self, a: NodeId, b: NodeId, key: &str) -> Option<&Value> {
        self.edge_attrs.get(&edge_key(a, b))?.get(key)
    }

    fn set_edge_attr(&mut self, a: NodeId, b: NodeId, key: &str, value: Value) -> GraphResult<()> {
        let attrs = self
            .edge_attrs
            .get_mut(&edge_key(a, b))
            .ok_or(GraphError::EdgeNotFound(a, b))?;
        attrs.insert(key.to_owned(), value);
        Ok(())
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

/// Collects nodes and edges, validating everything once in [`build`](Self::build).
///
/// ```rust
/// use sn_graph::{GraphBuilder, Topology};
///
/// let mut b = GraphBuilder::new();
/// let alice = b.add_node();
/// let bob = b.add_node();
/// b.add_edge(alice, bob);
/// let g = b.build().unwrap();
/// assert_eq!(g.neighbors(alice).collect::<Vec<_>>(), vec![bob]);
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    node_count: u32,
    node_attrs: Vec<(NodeId, String, Value)>,
    edges:      Vec<(NodeId, NodeId)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.node_count);
        self.node_count += 1;
        id
    }

    pub fn node_attr(&mut self, node: NodeId, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.node_attrs.push((node, key.into(), value.into()));
        self
    }

    /// Queue an undirected edge.  Duplicates collapse into one edge.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> &mut Self {
        self.edges.push((a, b));
        self
    }

    /// Build the graph, failing on edges or attributes that reference
    /// unknown nodes, and on self-loops.
    pub fn build(self) -> GraphResult<Graph> {
        let mut graph = Graph::with_nodes(self.node_count as usize);
        for (a, b) in self.edges {
            graph.add_edge(a, b)?;
        }
        for (node, key, value) in self.node_attrs {
            graph.set_node_attr(node, &key, value)?;
        }
        Ok(graph)
    }
}
