//! The single, client-local selection.
//!
//! At most one entity is selected at a time. Clicking a node replaces any
//! edge selection and vice versa; background clicks and explicit closes
//! clear it. Clicks on ids the graph does not hold are ignored.

use topology_graph::TopologyGraph;

/// What the viewer currently has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    None,
    /// A node, by id.
    NodeSelected(String),
    /// An edge, by id.
    EdgeSelected(String),
}

/// Interaction events reported by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A node was clicked.
    NodeClicked(String),
    /// An edge was clicked.
    EdgeClicked(String),
    /// Empty canvas was clicked.
    BackgroundClicked,
    /// The details panel was closed.
    Closed,
}

impl Selection {
    /// Next selection after `event`, given the current graph.
    #[must_use]
    pub fn transition(&self, event: SelectionEvent, graph: &TopologyGraph) -> Self {
        match event {
            SelectionEvent::NodeClicked(id) if graph.contains_node(&id) => Self::NodeSelected(id),
            SelectionEvent::EdgeClicked(id) if graph.contains_edge(&id) => Self::EdgeSelected(id),
            SelectionEvent::NodeClicked(_) | SelectionEvent::EdgeClicked(_) => self.clone(),
            SelectionEvent::BackgroundClicked | SelectionEvent::Closed => Self::None,
        }
    }

    /// Id of the selected node, if a node is selected.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeSelected(id) => Some(id),
            _ => None,
        }
    }

    /// Id of the selected edge, if an edge is selected.
    pub fn edge_id(&self) -> Option<&str> {
        match self {
            Self::EdgeSelected(id) => Some(id),
            _ => None,
        }
    }

    /// Whether nothing is selected.
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use topology_types::{Edge, Environment, Node, NodeKind};

    use super::*;

    fn graph() -> TopologyGraph {
        TopologyGraph::from_parts(
            Environment::Development,
            [
                Node::new("a", "A", NodeKind::Compute),
                Node::new("b", "B", NodeKind::Database),
            ],
            [Edge::new("ab", "a", "b")],
        )
        .unwrap_or_else(|_| TopologyGraph::new(Environment::Development))
    }

    #[test]
    fn node_then_edge_is_mutually_exclusive() {
        let g = graph();
        let s = Selection::None.transition(SelectionEvent::NodeClicked("a".into()), &g);
        assert_eq!(s.node_id(), Some("a"));
        let s = s.transition(SelectionEvent::EdgeClicked("ab".into()), &g);
        assert_eq!(s.edge_id(), Some("ab"));
        assert_eq!(s.node_id(), None);
        let s = s.transition(SelectionEvent::NodeClicked("b".into()), &g);
        assert_eq!(s, Selection::NodeSelected("b".into()));
    }

    #[test]
    fn background_and_close_clear() {
        let g = graph();
        let s = Selection::NodeSelected("a".into());
        assert!(s.transition(SelectionEvent::BackgroundClicked, &g).is_none());
        let s = Selection::EdgeSelected("ab".into());
        assert!(s.transition(SelectionEvent::Closed, &g).is_none());
        assert!(Selection::None.transition(SelectionEvent::Closed, &g).is_none());
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let g = graph();
        let s = Selection::NodeSelected("a".into());
        assert_eq!(s.transition(SelectionEvent::NodeClicked("ghost".into()), &g), s);
        assert_eq!(s.transition(SelectionEvent::EdgeClicked("a".into()), &g), s);
        assert!(Selection::None
            .transition(SelectionEvent::EdgeClicked("nope".into()), &g)
            .is_none());
    }
}
