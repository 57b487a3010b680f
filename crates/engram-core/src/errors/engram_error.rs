use super::{ConsolidationError, EmbeddingError, IngestError, RetrievalError, StorageError};

/// Top-level error type for the Engram memory engine.
/// All subsystem errors convert into this via `From` impls.
///
/// Errors here represent the `Fatal` and `UsageError` kinds of the taxonomy
/// (propagated to the caller). `NotFound`, `IntegrityViolation`,
/// `ParseFailure`, `BackendInitFailure`, `BackendQueryFailure`, and
/// `ModelIncompatibility` are swallowed or degrade-in-place at the point
/// they occur and never reach this type except when logged.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("retrieval error: {0}")]
    RetrievalError(#[from] RetrievalError),

    #[error("consolidation error: {0}")]
    ConsolidationError(#[from] ConsolidationError),

    #[error("ingest error: {0}")]
    IngestError(#[from] IngestError),

    #[error("usage error: {0}")]
    UsageError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("concurrency error: {0}")]
    ConcurrencyError(String),
}

/// Convenience type alias used throughout the workspace.
pub type EngramResult<T> = Result<T, EngramError>;
