use serde::{Deserialize, Serialize};

/// Configuration for the SQLite storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `brain.db` (and the vector store directory/archive).
    pub base_path: String,
    pub wal_mode: bool,
    pub foreign_keys: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: ".engram".to_string(),
            wal_mode: true,
            foreign_keys: true,
        }
    }
}
