use serde::{Deserialize, Serialize};

/// Configuration for hybrid retrieval (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
    pub default_spread_depth: u32,
    pub spreading_decay: f64,
    pub semantic_seed_count: usize,
    pub reinforce_top_n: usize,
    /// BM25 column weights: (title, content, summary).
    pub bm25_weights: (f64, f64, f64),
    /// LIKE-fallback column weights: (title, summary, content).
    pub like_weights: (f64, f64, f64),
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 20,
            default_spread_depth: 2,
            spreading_decay: 0.5,
            semantic_seed_count: 5,
            reinforce_top_n: 10,
            bm25_weights: (10.0, 1.0, 5.0),
            like_weights: (1.0, 0.5, 0.3),
        }
    }
}
