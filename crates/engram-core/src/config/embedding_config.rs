use serde::{Deserialize, Serialize};

/// Configuration for the embedding bridge (C8) and vector store (C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `local` (TF-IDF fallback provider) or `openai`.
    pub provider: String,
    pub dimensions: usize,
    /// Prefer the HNSW-backed ANN index; fall back to brute-force on init error.
    pub prefer_ann: bool,
    /// Characters of `content` folded into the embedding text builder.
    pub content_chars: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            dimensions: 256,
            prefer_ann: true,
            content_chars: 1000,
        }
    }
}
