/// Sleep / consolidation phase errors (C6, C7).
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error("unknown sleep phase: {0}")]
    UnknownPhase(String),

    #[error("phase '{phase}' failed: {message}")]
    PhaseFailed { phase: String, message: String },

    #[error("batch commit failed after retry: {0}")]
    BatchCommitFailed(String),
}
