/// Embedding bridge / vector store subsystem errors (C2, C8).
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("provider '{provider}' failed to encode text: {message}")]
    EncodeFailed { provider: String, message: String },

    #[error("vector backend init failed: {0}")]
    BackendInitFailed(String),

    #[error("vector backend query failed: {0}")]
    BackendQueryFailed(String),

    #[error("model identity mismatch: stored ({stored_model}, dim={stored_dim}), current ({current_model}, dim={current_dim})")]
    ModelIncompatibility {
        stored_model: String,
        stored_dim: usize,
        current_model: String,
        current_dim: usize,
    },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
