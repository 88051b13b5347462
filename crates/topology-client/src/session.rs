//! A viewer's client-side session.
//!
//! [`ClientSession`] owns exactly one graph at a time and wires together
//! the reconciler, the selection and the layout engine. Broadcast messages
//! flow in through [`handle_text`](ClientSession::handle_text); user
//! actions come in through [`select`](ClientSession::select),
//! [`request_layout`](ClientSession::request_layout) and
//! [`drag_node`](ClientSession::drag_node).
//!
//! Layout runs only on user action. A request snapshots the graph and
//! carries a generation number; its result is applied with
//! [`complete_layout`](ClientSession::complete_layout), which copies
//! positions only and discards results from superseded requests.

use std::collections::{BTreeMap, VecDeque};

use topology_graph::{TopologyGraph, starting_topology};
use topology_layout::{ForceSimulation, LayoutAlgorithm, LayoutOptions, layout_with_options};
use topology_types::{
    AlertEvent, Edge, Environment, Node, Position, ServerEvent, ServerMessage, SystemStatus,
};
use tracing::{debug, info};

use crate::error::ClientError;
use crate::reconciler::{self, ApplyOutcome, ReconcilerState};
use crate::selection::{Selection, SelectionEvent};

/// Most alerts kept in the feed.
pub const ALERT_FEED_CAPACITY: usize = 50;

/// Everything a layout run needs, detached from the live graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest {
    /// Generation to hand back to [`ClientSession::complete_layout`].
    pub generation: u64,
    /// Algorithm to run.
    pub algorithm: LayoutAlgorithm,
    /// Nodes as they were when the layout was requested.
    pub nodes: Vec<Node>,
    /// Edges as they were when the layout was requested.
    pub edges: Vec<Edge>,
    /// Positions captured when the environment was loaded.
    pub original_positions: BTreeMap<String, Position>,
    /// Algorithm tunables.
    pub options: LayoutOptions,
}

impl LayoutRequest {
    /// Run the layout to completion.
    pub fn compute(&self) -> Vec<Node> {
        layout_with_options(
            &self.nodes,
            &self.edges,
            self.algorithm,
            &self.original_positions,
            &self.options,
        )
    }

    /// A steppable simulation for force-directed requests over two or more
    /// nodes, so the caller can run it in chunks. `None` otherwise; use
    /// [`compute`](Self::compute) for those.
    pub fn force_simulation(&self) -> Option<ForceSimulation> {
        (self.algorithm == LayoutAlgorithm::ForceDirected && self.nodes.len() > 1)
            .then(|| ForceSimulation::new(&self.nodes, &self.edges, self.options.force))
    }
}

/// Client-side state for one viewer.
#[derive(Debug, Clone)]
pub struct ClientSession {
    graph: TopologyGraph,
    selection: Selection,
    state: ReconcilerState,
    algorithm: LayoutAlgorithm,
    options: LayoutOptions,
    original_positions: BTreeMap<String, Position>,
    generation: u64,
    alerts: VecDeque<AlertEvent>,
    last_status: Option<SystemStatus>,
}

impl ClientSession {
    /// Start a session on `graph` with no layout outstanding.
    pub fn new(graph: TopologyGraph) -> Self {
        let original_positions = graph.positions();
        Self {
            graph,
            selection: Selection::None,
            state: ReconcilerState::Idle,
            algorithm: LayoutAlgorithm::default(),
            options: LayoutOptions::default(),
            original_positions,
            generation: 0,
            alerts: VecDeque::with_capacity(ALERT_FEED_CAPACITY),
            last_status: None,
        }
    }

    /// Start a session on an environment's starting topology and lay it
    /// out with the default algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the starting topology is invalid.
    pub fn open(environment: Environment) -> Result<Self, ClientError> {
        let mut session = Self::new(starting_topology(environment)?);
        session.run_layout(session.algorithm);
        Ok(session)
    }

    /// Use custom layout tunables for subsequent requests.
    #[must_use]
    pub fn with_layout_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The live graph.
    pub const fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Environment of the live graph.
    pub const fn environment(&self) -> Environment {
        self.graph.environment()
    }

    /// Current selection.
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current reconciler state.
    pub const fn state(&self) -> ReconcilerState {
        self.state
    }

    /// Algorithm of the most recent layout request.
    pub const fn algorithm(&self) -> LayoutAlgorithm {
        self.algorithm
    }

    /// Positions captured when the environment was loaded.
    pub const fn original_positions(&self) -> &BTreeMap<String, Position> {
        &self.original_positions
    }

    /// Recent alerts, newest first.
    pub fn alerts(&self) -> impl ExactSizeIterator<Item = &AlertEvent> {
        self.alerts.iter()
    }

    /// Most recent service roll-up.
    pub const fn last_status(&self) -> Option<&SystemStatus> {
        self.last_status.as_ref()
    }

    // -------------------------------------------------------------------
    // Environment
    // -------------------------------------------------------------------

    /// Replace the graph wholesale and request a layout for it.
    ///
    /// Selection is cleared, any outstanding layout is superseded, and the
    /// new graph's positions become the originals the manual layout
    /// restores.
    pub fn load_environment(&mut self, graph: TopologyGraph) -> LayoutRequest {
        info!(
            from = %self.graph.environment(),
            to = %graph.environment(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "environment switched"
        );
        self.original_positions = graph.positions();
        self.graph = graph;
        self.selection = Selection::None;
        self.request_layout(self.algorithm)
    }

    /// Switch to an environment's starting topology and lay it out now.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the starting topology is invalid.
    pub fn switch_environment(&mut self, environment: Environment) -> Result<usize, ClientError> {
        let request = self.load_environment(starting_topology(environment)?);
        let laid_out = request.compute();
        Ok(self.complete_layout(request.generation, &laid_out).unwrap_or(0))
    }

    // -------------------------------------------------------------------
    // Inbound messages
    // -------------------------------------------------------------------

    /// Decode and apply one text frame from the broadcast server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the frame is not a valid server
    /// message. The session is unchanged in that case.
    pub fn handle_text(&mut self, text: &str) -> Result<ApplyOutcome, ClientError> {
        let message: ServerMessage = serde_json::from_str(text)?;
        Ok(self.handle_message(&message))
    }

    /// Apply one decoded server message.
    pub fn handle_message(&mut self, message: &ServerMessage) -> ApplyOutcome {
        match &message.event {
            ServerEvent::Alert(alert) => {
                self.alerts.push_front(alert.clone());
                self.alerts.truncate(ALERT_FEED_CAPACITY);
                ApplyOutcome::AlertRecorded
            }
            ServerEvent::SystemStatus(status) => {
                self.last_status = Some(status.clone());
                reconciler::apply(&mut self.graph, message)
            }
            _ => reconciler::apply(&mut self.graph, message),
        }
    }

    // -------------------------------------------------------------------
    // User actions
    // -------------------------------------------------------------------

    /// Feed a selection event from the rendering layer.
    pub fn select(&mut self, event: SelectionEvent) -> &Selection {
        self.selection = self.selection.transition(event, &self.graph);
        &self.selection
    }

    /// Snapshot the graph for a layout run and wait for its result.
    pub fn request_layout(&mut self, algorithm: LayoutAlgorithm) -> LayoutRequest {
        self.generation = self.generation.saturating_add(1);
        self.algorithm = algorithm;
        self.state = ReconcilerState::AwaitingLayout {
            generation: self.generation,
        };
        debug!(generation = self.generation, %algorithm, "layout requested");
        LayoutRequest {
            generation: self.generation,
            algorithm,
            nodes: self.graph.nodes().to_vec(),
            edges: self.graph.edges().to_vec(),
            original_positions: self.original_positions.clone(),
            options: self.options,
        }
    }

    /// Apply a finished layout.
    ///
    /// Returns how many nodes moved, or `None` if `generation` is not the
    /// outstanding request (a newer request or an environment switch
    /// superseded it).
    pub fn complete_layout(&mut self, generation: u64, laid_out: &[Node]) -> Option<usize> {
        if self.state != (ReconcilerState::AwaitingLayout { generation }) {
            debug!(generation, current = self.generation, "stale layout discarded");
            return None;
        }
        let moved = self.graph.apply_positions(laid_out);
        self.state = ReconcilerState::Idle;
        Some(moved)
    }

    /// Request, compute and apply a layout in one step.
    pub fn run_layout(&mut self, algorithm: LayoutAlgorithm) -> usize {
        let request = self.request_layout(algorithm);
        let laid_out = request.compute();
        self.complete_layout(request.generation, &laid_out).unwrap_or(0)
    }

    /// Move a node to where the user dropped it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the node does not exist.
    pub fn drag_node(&mut self, id: &str, position: Position) -> Result<(), ClientError> {
        self.graph.set_position(id, position)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;
    use topology_types::{AlertSeverity, NodeKind, Pong};

    use super::*;

    fn small_graph(environment: Environment) -> TopologyGraph {
        TopologyGraph::from_parts(
            environment,
            [
                Node::new("a", "A", NodeKind::Gateway).at(10.0, 10.0),
                Node::new("b", "B", NodeKind::Compute).at(20.0, 20.0),
            ],
            [Edge::new("ab", "a", "b")],
        )
        .unwrap()
    }

    fn alert(n: usize) -> ServerMessage {
        ServerMessage::now(ServerEvent::Alert(AlertEvent {
            severity: AlertSeverity::Info,
            message: format!("alert {n}"),
            metric: None,
            value: None,
            threshold: None,
            timestamp: Utc::now(),
        }))
    }

    #[test]
    fn alert_feed_is_capped_newest_first() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        for n in 0..60 {
            assert_eq!(session.handle_message(&alert(n)), ApplyOutcome::AlertRecorded);
        }
        assert_eq!(session.alerts().len(), ALERT_FEED_CAPACITY);
        assert_eq!(session.alerts().next().map(|a| a.message.as_str()), Some("alert 59"));
        assert_eq!(session.alerts().last().map(|a| a.message.as_str()), Some("alert 10"));
    }

    #[test]
    fn malformed_frame_is_a_decode_error_and_changes_nothing() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        let before = session.graph().clone();
        let err = session.handle_text("{\"type\":\"metric_update\"").unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
        assert_eq!(session.graph(), &before);
    }

    #[test]
    fn stale_layout_is_discarded() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        let first = session.request_layout(LayoutAlgorithm::Grid);
        let second = session.request_layout(LayoutAlgorithm::Circular);

        assert_eq!(session.complete_layout(first.generation, &first.compute()), None);
        assert_eq!(
            session.state(),
            ReconcilerState::AwaitingLayout {
                generation: second.generation
            }
        );
        assert_eq!(session.complete_layout(second.generation, &second.compute()), Some(2));
        assert_eq!(session.state(), ReconcilerState::Idle);
        assert_eq!(session.complete_layout(second.generation, &second.compute()), None);
    }

    #[test]
    fn metrics_applied_while_awaiting_layout_survive() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        let request = session.request_layout(LayoutAlgorithm::Grid);

        let raw = r#"{"type":"metric_update","data":{"measurement":"cpu_usage","value":95.0,
            "timestamp":"2024-05-01T12:00:00Z","tags":{"node_id":"b"}}}"#;
        session.handle_text(raw).unwrap();

        session.complete_layout(request.generation, &request.compute());
        let b = session.graph().node("b").unwrap();
        assert_eq!(b.metrics.as_ref().and_then(|m| m.cpu), Some(95.0));
        assert_eq!(b.position, Some(Position::new(250.0, 50.0)));
    }

    #[test]
    fn environment_switch_clears_selection_and_supersedes_layout() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        session.select(SelectionEvent::NodeClicked(String::from("a")));
        let pending = session.request_layout(LayoutAlgorithm::Grid);

        let fresh = session.load_environment(small_graph(Environment::Development));
        assert!(session.selection().is_none());
        assert_eq!(session.environment(), Environment::Development);
        assert_eq!(session.complete_layout(pending.generation, &pending.compute()), None);
        assert!(session.complete_layout(fresh.generation, &fresh.compute()).is_some());
    }

    #[test]
    fn manual_layout_restores_positions_after_drag() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        session.drag_node("a", Position::new(700.0, 600.0)).unwrap();
        session.run_layout(LayoutAlgorithm::Circular);
        session.run_layout(LayoutAlgorithm::Manual);
        assert_eq!(
            session.graph().node("a").unwrap().position,
            Some(Position::new(10.0, 10.0))
        );
    }

    #[test]
    fn drag_unknown_node_is_an_error() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        assert!(session.drag_node("ghost", Position::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn force_requests_can_run_in_chunks() {
        let mut session = ClientSession::new(small_graph(Environment::Staging));
        let request = session.request_layout(LayoutAlgorithm::ForceDirected);
        let mut simulation = request.force_simulation().unwrap();
        while !simulation.is_finished() {
            simulation.step(10);
            // A message between chunks does not disturb the pending layout.
            session.handle_message(&ServerMessage::now(ServerEvent::Pong(Pong {
                timestamp: Utc::now(),
            })));
        }
        let laid_out = simulation.apply_to(&request.nodes);
        assert_eq!(laid_out, request.compute());
        assert_eq!(session.complete_layout(request.generation, &laid_out), Some(2));
    }
}
