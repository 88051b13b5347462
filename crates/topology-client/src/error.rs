//! Error types for the client session.

use topology_graph::GraphError;

/// Errors surfaced to the rendering layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An inbound frame was not a valid server message.
    #[error("malformed server frame: {source}")]
    Decode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A graph operation failed.
    #[error("graph error: {source}")]
    Graph {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },
}
