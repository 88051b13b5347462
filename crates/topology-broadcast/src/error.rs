//! Error types for the broadcast layer.

/// Errors raised while preparing or delivering broadcast frames.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// A message could not be serialized to JSON.
    #[error("failed to encode message: {source}")]
    Encode {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
