//! Error types for the `topology-graph` crate.
//!
//! All fallible graph operations return [`GraphError`] through the standard
//! [`Result`] type.

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An edge referenced a node id that is not in the graph.
    #[error("edge {edge} references missing node {missing} ({source_id} -> {target_id})")]
    DanglingReference {
        /// The rejected edge.
        edge: String,
        /// Source node id as given on the edge.
        source_id: String,
        /// Target node id as given on the edge.
        target_id: String,
        /// The first id that could not be resolved.
        missing: String,
    },

    /// A node with the same id already exists.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge with the same id already exists.
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(String),

    /// No node with the given id exists.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge with the given id exists.
    #[error("edge not found: {0}")]
    EdgeNotFound(String),
}
