//! Unit tests for sn-graph.

#[cfg(test)]
mod graph_tests {
    use sn_core::{NodeId, Value};

    use crate::{Graph, GraphBuilder, GraphError, Topology};

    fn triangle() -> Graph {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node();
        let n1 = b.add_node();
        let n2 = b.add_node();
        b.add_edge(n0, n1).add_edge(n1, n2).add_edge(n2, n0);
        b.build().unwrap()
    }

    #[test]
    fn counts() {
        let g = triangle();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.degree(NodeId(1)), 2);
    }

    #[test]
    fn neighbors_are_sorted() {
        let mut g = Graph::with_nodes(4);
        g.add_edge(NodeId(0), NodeId(3)).unwrap();
        g.add_edge(NodeId(0), NodeId(1)).unwrap();
        g.add_edge(NodeId(2), NodeId(0)).unwrap();
        let n: Vec<_> = g.neighbors(NodeId(0)).collect();
        assert_eq!(n, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn duplicate_edge_is_noop() {
        let mut g = Graph::with_nodes(2);
        assert!(g.add_edge(NodeId(0), NodeId(1)).unwrap());
        assert!(!g.add_edge(NodeId(1), NodeId(0)).unwrap());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn self_loop_and_unknown_nodes_rejected() {
        let mut g = Graph::with_nodes(2);
        assert_eq!(g.add_edge(NodeId(0), NodeId(0)), Err(GraphError::SelfLoop(NodeId(0))));
        assert_eq!(g.add_edge(NodeId(0), NodeId(9)), Err(GraphError::NodeNotFound(NodeId(9))));

        let mut b = GraphBuilder::new();
        let n0 = b.add_node();
        b.add_edge(n0, NodeId(5));
        assert!(b.build().is_err());
    }

    #[test]
    fn node_attributes() {
        let mut g = triangle();
        g.set_node_attr(NodeId(2), "label", Value::from("hub")).unwrap();
        assert_eq!(g.node_attr(NodeId(2), "label"), Some(&Value::from("hub")));
        assert_eq!(g.node_attr(NodeId(1), "label"), None);
        assert!(g.set_node_attr(NodeId(7), "label", Value::Null).is_err());
    }

    #[test]
    fn edge_attributes_are_symmetric() {
        let mut g = triangle();
        g.set_edge_attr(NodeId(1), NodeId(0), "weight", Value::from(0.5)).unwrap();
        assert_eq!(g.edge_attr(NodeId(0), NodeId(1), "weight"), Some(&Value::from(0.5)));
        assert_eq!(
            g.set_edge_attr(NodeId(0), NodeId(0), "weight", Value::Null),
            Err(GraphError::EdgeNotFound(NodeId(0), NodeId(0)))
        );
    }

    #[test]
    fn remove_node_leaves_stable_ids() {
        let mut g = triangle();
        g.remove_node(NodeId(1)).unwrap();
        assert!(!g.contains(NodeId(1)));
        assert!(g.contains(NodeId(2)));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.node_ids().collect::<Vec<_>>(), vec![NodeId(0), NodeId(2)]);
        assert_eq!(g.neighbors(NodeId(0)).collect::<Vec<_>>(), vec![NodeId(2)]);
        assert!(g.remove_node(NodeId(1)).is_err());
    }

    #[test]
    fn remove_edge() {
        let mut g = triangle();
        g.remove_edge(NodeId(2), NodeId(0)).unwrap();
        assert!(!g.has_edge(NodeId(0), NodeId(2)));
        assert!(g.remove_edge(NodeId(0), NodeId(2)).is_err());
    }

    #[test]
    fn unknown_node_has_no_neighbors() {
        let g = Graph::empty();
        assert!(g.is_empty());
        assert_eq!(g.neighbors(NodeId(3)).count(), 0);
    }
}

#[cfg(test)]
mod generator_tests {
    use sn_core::{NodeId, SimRng};

    use crate::generators::{complete, erdos_renyi, path, star};
    use crate::Topology;

    #[test]
    fn complete_graph() {
        let g = complete(5);
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 10);
    }

    #[test]
    fn path_graph() {
        let g = path(4);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.neighbors(NodeId(0)).collect::<Vec<_>>(), vec![NodeId(1)]);
    }

    #[test]
    fn star_graph() {
        let g = star(6);
        assert_eq!(g.degree(NodeId(0)), 5);
        assert_eq!(g.degree(NodeId(3)), 1);
    }

    #[test]
    fn erdos_renyi_extremes_and_determinism() {
        assert_eq!(erdos_renyi(6, 0.0, &mut SimRng::new(1)).edge_count(), 0);
        assert_eq!(erdos_renyi(6, 1.0, &mut SimRng::new(1)).edge_count(), 15);

        let a: Vec<_> = erdos_renyi(30, 0.2, &mut SimRng::new(9)).edges().collect();
        let b: Vec<_> = erdos_renyi(30, 0.2, &mut SimRng::new(9)).edges().collect();
        assert_eq!(a, b);
    }
}
