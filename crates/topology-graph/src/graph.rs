//! The topology graph: infrastructure nodes and the links between them.
//!
//! A [`TopologyGraph`] is scoped to one [`Environment`]. Nodes and edges are
//! kept in insertion order (layouts depend on it) with id indexes on the
//! side for constant-time lookup.
//!
//! Two invariants are enforced at the boundary:
//!
//! - **Referential integrity**: an edge is only stored when both endpoints
//!   already exist. Otherwise it is rejected with
//!   [`GraphError::DanglingReference`] and the graph is left unchanged.
//! - **Status consistency**: a node whose metrics carry cpu or latency always
//!   holds the status derived from them. Other nodes keep whatever status
//!   was set explicitly, `unknown` by default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use topology_types::{
    Edge, EdgeMetricsDelta, Environment, Node, NodeMetrics, NodeStatus, Position,
};
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::status::derived_status;

/// A status transition caused by a metric update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the update.
    pub previous: NodeStatus,
    /// Status after the update.
    pub current: NodeStatus,
}

impl StatusChange {
    /// Whether the status actually moved.
    pub fn changed(self) -> bool {
        self.previous != self.current
    }
}

/// Plain serializable copy of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Environment the graph belongs to.
    pub environment: Environment,
    /// Nodes in insertion order.
    pub nodes: Vec<Node>,
    /// Edges in insertion order.
    pub edges: Vec<Edge>,
}

/// Nodes and edges for one environment.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyGraph {
    /// Environment this graph describes.
    environment: Environment,
    /// Nodes in insertion order.
    nodes: Vec<Node>,
    /// Node id -> index into `nodes`.
    node_index: BTreeMap<String, usize>,
    /// Edges in insertion order.
    edges: Vec<Edge>,
    /// Edge id -> index into `edges`.
    edge_index: BTreeMap<String, usize>,
}

impl TopologyGraph {
    /// Create an empty graph for the given environment.
    pub const fn new(environment: Environment) -> Self {
        Self {
            environment,
            nodes: Vec::new(),
            node_index: BTreeMap::new(),
            edges: Vec::new(),
            edge_index: BTreeMap::new(),
        }
    }

    /// Build a graph from nodes and edges, inserting nodes first.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] raised by [`insert_node`] or
    /// [`insert_edge`].
    ///
    /// [`insert_node`]: Self::insert_node
    /// [`insert_edge`]: Self::insert_edge
    pub fn from_parts(
        environment: Environment,
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(environment);
        for node in nodes {
            graph.insert_node(node)?;
        }
        for edge in edges {
            graph.insert_edge(edge)?;
        }
        Ok(graph)
    }

    /// Rebuild a graph from a snapshot, re-checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the snapshot holds duplicates or dangling
    /// edges.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        Self::from_parts(snapshot.environment, snapshot.nodes, snapshot.edges)
    }

    /// Copy the graph into a serializable snapshot.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            environment: self.environment,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Environment this graph describes.
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    // -------------------------------------------------------------------
    // Node operations
    // -------------------------------------------------------------------

    /// Add a node. Status is re-derived if the node carries cpu or latency.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if the id is already present.
    pub fn insert_node(&mut self, mut node: Node) -> Result<(), GraphError> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if let Some(status) = node.metrics.as_ref().and_then(derived_status) {
            node.status = status;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|&i| self.nodes.get(i))
    }

    /// Whether a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, GraphError> {
        self.node_index
            .get(id)
            .and_then(|&i| self.nodes.get_mut(i))
            .ok_or_else(|| GraphError::NodeNotFound(id.to_owned()))
    }

    /// Merge a partial metrics update into a node and re-derive its status.
    ///
    /// Fields absent from `delta` are untouched. Position is never changed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if no node has this id.
    pub fn apply_node_update(
        &mut self,
        id: &str,
        delta: &NodeMetrics,
    ) -> Result<StatusChange, GraphError> {
        let node = self.node_mut(id)?;
        let previous = node.status;

        let metrics = node.metrics.get_or_insert_with(NodeMetrics::default);
        metrics.merge(delta);
        if let Some(status) = derived_status(metrics) {
            node.status = status;
        }

        let change = StatusChange {
            previous,
            current: node.status,
        };
        if change.changed() {
            debug!(node = id, from = %previous, to = %change.current, "Node status changed");
        }
        Ok(change)
    }

    /// Set a node's status directly.
    ///
    /// Only nodes without cpu/latency metrics accept a direct status; for
    /// the rest the derived status wins and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if no node has this id.
    pub fn set_node_status(&mut self, id: &str, status: NodeStatus) -> Result<bool, GraphError> {
        let node = self.node_mut(id)?;
        if node
            .metrics
            .as_ref()
            .is_some_and(NodeMetrics::has_status_inputs)
        {
            return Ok(false);
        }
        node.status = status;
        Ok(true)
    }

    /// Move a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if no node has this id.
    pub fn set_position(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        self.node_mut(id)?.position = Some(position);
        Ok(())
    }

    /// Current positions keyed by node id. Unpositioned nodes are omitted.
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes
            .iter()
            .filter_map(|n| n.position.map(|p| (n.id.clone(), p)))
            .collect()
    }

    /// Copy positions from laid-out nodes onto matching nodes in this graph.
    ///
    /// Only `position` is touched, so metrics and status applied since the
    /// layout was requested survive. Returns how many nodes moved.
    pub fn apply_positions(&mut self, laid_out: &[Node]) -> usize {
        let mut moved: usize = 0;
        for source in laid_out {
            let Some(position) = source.position else {
                continue;
            };
            if let Some(node) = self
                .node_index
                .get(&source.id)
                .and_then(|&i| self.nodes.get_mut(i))
            {
                node.position = Some(position);
                moved = moved.saturating_add(1);
            }
        }
        moved
    }

    // -------------------------------------------------------------------
    // Edge operations
    // -------------------------------------------------------------------

    /// Add an edge after checking both endpoints exist.
    ///
    /// Percentage metrics are clamped into `[0, 100]` on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingReference`] if the source or target is
    /// missing, or [`GraphError::DuplicateEdge`] if the id is taken. Either
    /// way the graph is unchanged.
    pub fn insert_edge(&mut self, mut edge: Edge) -> Result<(), GraphError> {
        let missing = [&edge.source_id, &edge.target_id]
            .into_iter()
            .find(|id| !self.node_index.contains_key(id.as_str()))
            .cloned();
        if let Some(missing) = missing {
            warn!(
                edge = edge.id,
                source_id = edge.source_id,
                target_id = edge.target_id,
                missing,
                "Rejected edge with dangling reference"
            );
            return Err(GraphError::DanglingReference {
                edge: edge.id,
                source_id: edge.source_id,
                target_id: edge.target_id,
                missing,
            });
        }
        if self.edge_index.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        if !edge.metrics.is_in_range() {
            warn!(edge = edge.id, "Edge metrics out of range, clamping");
            edge.metrics = edge.metrics.clamped();
        }
        self.edge_index.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge);
        Ok(())
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).and_then(|&i| self.edges.get(i))
    }

    /// Whether an edge with this id exists.
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Merge a partial metrics update into an edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if no edge has this id.
    pub fn apply_edge_update(&mut self, id: &str, delta: &EdgeMetricsDelta) -> Result<(), GraphError> {
        let edge = self
            .edge_index
            .get(id)
            .and_then(|&i| self.edges.get_mut(i))
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_owned()))?;
        edge.metrics.merge(delta);
        Ok(())
    }

    /// Edges leaving the given node, in insertion order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source_id == id)
    }

    /// Edges arriving at the given node, in insertion order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target_id == id)
    }
}
