//! Workflow graph.
//!
//! Nodes and edges are kept in authoring order, since "first edge" and
//! "first trigger" are meaningful to the walker. Structural problems
//! (dangling edges, duplicate IDs, cycles) are reported by
//! [`WorkflowGraph::diagnostics`] using petgraph, but never rejected: the
//! walker tolerates all of them.

use crate::definition::WorkflowDefinition;
use crate::edge::Edge;
use crate::node::{Node, NodeId};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// A resolved workflow graph.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Map from NodeId to the first node with that ID.
    node_index_map: HashMap<NodeId, usize>,
    duplicate_ids: Vec<NodeId>,
}

/// Structural findings about a workflow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDiagnostics {
    /// Edges whose source or target names no node, in authoring order.
    pub dangling_edges: Vec<Edge>,
    /// IDs shared by more than one node.
    pub duplicate_node_ids: Vec<NodeId>,
    /// Nodes no trigger can reach.
    pub unreachable_nodes: Vec<NodeId>,
    /// Whether the graph contains a cycle.
    pub has_cycle: bool,
}

impl GraphDiagnostics {
    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_edges.is_empty()
            && self.duplicate_node_ids.is_empty()
            && self.unreachable_nodes.is_empty()
            && !self.has_cycle
    }
}

impl WorkflowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a stored definition.
    #[must_use]
    pub fn from_definition(definition: &WorkflowDefinition) -> Self {
        let mut graph = Self::new();
        for spec in &definition.nodes {
            graph.add_node(Node::from_spec(spec));
        }
        for spec in &definition.edges {
            graph.add_edge(Edge::from_spec(spec));
        }
        graph
    }

    /// Appends a node. A node reusing an existing ID is kept but never
    /// resolved by ID.
    pub fn add_node(&mut self, node: Node) {
        let index = self.nodes.len();
        match self.node_index_map.entry(node.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
            Entry::Occupied(_) => {
                if !self.duplicate_ids.contains(&node.id) {
                    self.duplicate_ids.push(node.id.clone());
                }
            }
        }
        self.nodes.push(node);
    }

    /// Appends an edge. Edges are not validated.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Returns the first node with the given ID.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.node_index_map.get(node_id).map(|&index| &self.nodes[index])
    }

    /// Returns all nodes in authoring order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all edges in authoring order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns trigger nodes in authoring order.
    pub fn triggers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_trigger())
    }

    /// Returns the edges leaving a node, in authoring order.
    #[must_use]
    pub fn outgoing(&self, node_id: &NodeId) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|edge| &edge.source == node_id)
            .collect()
    }

    /// Reports structural problems.
    #[must_use]
    pub fn diagnostics(&self) -> GraphDiagnostics {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let indices: HashMap<&NodeId, NodeIndex> = self
            .node_index_map
            .iter()
            .map(|(id, &position)| (id, graph.add_node(position)))
            .collect();

        let mut dangling_edges = Vec::new();
        for edge in &self.edges {
            match (indices.get(&edge.source), indices.get(&edge.target)) {
                (Some(&source), Some(&target)) => {
                    graph.add_edge(source, target, ());
                }
                _ => dangling_edges.push(edge.clone()),
            }
        }

        let mut reachable = vec![false; graph.node_count()];
        for trigger in self.triggers() {
            let Some(&start) = indices.get(&trigger.id) else {
                continue;
            };
            let mut dfs = Dfs::new(&graph, start);
            while let Some(visited) = dfs.next(&graph) {
                reachable[visited.index()] = true;
            }
        }

        let mut unreachable_nodes: Vec<NodeId> = indices
            .iter()
            .filter(|(_, index)| !reachable[index.index()])
            .map(|(id, _)| (*id).clone())
            .collect();
        unreachable_nodes.sort_by_key(|id| self.node_index_map.get(id).copied());

        GraphDiagnostics {
            dangling_edges,
            duplicate_node_ids: self.duplicate_ids.clone(),
            unreachable_nodes,
            has_cycle: is_cyclic_directed(&graph),
        }
    }
}
