/// Retrieval subsystem errors (C5).
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("fts query failed: {0}")]
    FtsQueryFailed(String),

    #[error("invalid `since` expression: {0}")]
    InvalidSince(String),

    #[error("invalid sort key: {0}")]
    InvalidSortKey(String),
}
