/// Ingestion subsystem errors (C4). Most parser failures are recovered
/// internally (the offending item is skipped); this type exists for the
/// cases a caller needs to observe (e.g. the git log itself is unreadable).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("parse failure in {path}: {message}")]
    ParseFailure { path: String, message: String },

    #[error("git operation failed: {0}")]
    GitFailed(String),

    #[error("io error reading {path}: {message}")]
    IoError { path: String, message: String },

    #[error("sub-tool timed out after {seconds}s: {tool}")]
    Timeout { tool: String, seconds: u64 },
}
