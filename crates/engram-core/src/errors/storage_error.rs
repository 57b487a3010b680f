/// Storage-backend subsystem errors (C1).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at v{version:03} ({name}): {message}")]
    MigrationFailed {
        version: u32,
        name: String,
        message: String,
    },

    #[error("schema version mismatch: database is v{found}, engine expects v{expected}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}
