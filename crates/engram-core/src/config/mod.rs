pub mod consolidation_config;
pub mod decay_config;
pub mod embedding_config;
pub mod ingest_config;
pub mod retrieval_config;
pub mod storage_config;

use serde::{Deserialize, Serialize};

pub use consolidation_config::ConsolidationConfig;
pub use decay_config::DecayConfig;
pub use embedding_config::EmbeddingConfig;
pub use ingest_config::IngestConfig;
pub use retrieval_config::RetrievalConfig;
pub use storage_config::StorageConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngramConfig {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub consolidation: ConsolidationConfig,
    pub decay: DecayConfig,
    pub ingest: IngestConfig,
}

impl EngramConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg = EngramConfig::from_toml("[retrieval]\ndefault_top_k = 50\n").unwrap();
        assert_eq!(cfg.retrieval.default_top_k, 50);
        assert_eq!(cfg.retrieval.default_spread_depth, 2);
        assert_eq!(cfg.consolidation.relate_threshold, 0.75);
    }
}
