//! The embedding bridge (C8): resolves which [`EmbeddingProvider`] backs a
//! `Brain` instance and exposes a small degradation chain so a primary
//! provider's failure falls back to the always-available local one instead
//! of failing the whole `add_memory` call (spec §4.8).

pub mod openai;
pub mod text_builder;
pub mod tfidf;

use std::sync::Arc;

use tracing::warn;

use engram_core::config::EmbeddingConfig;
use engram_core::errors::EngramResult;
use engram_core::EmbeddingProvider;

pub use tfidf::TfIdfFallback;

/// A provider plus the stateless local fallback it degrades to. `encode`
/// tries `primary` first; on error it logs and retries against `fallback`,
/// so a transient remote-API outage never blocks ingestion.
pub struct DegradingProvider {
    primary: Option<Arc<dyn EmbeddingProvider>>,
    fallback: Arc<TfIdfFallback>,
}

impl DegradingProvider {
    /// Resolves the configured provider (`config.provider`, typically fed
    /// from `EMBEDDING_PROVIDER`). `"local"` uses only the fallback;
    /// `"openai"` tries [`openai::OpenAiProvider`] first and degrades to the
    /// fallback on any encode failure.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let fallback = Arc::new(TfIdfFallback::new(config.dimensions));

        let primary: Option<Arc<dyn EmbeddingProvider>> = match config.provider.as_str() {
            "openai" => match openai::OpenAiProvider::from_env(config.dimensions) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(e) => {
                    warn!(error = %e, "openai embedding provider unavailable, using local fallback only");
                    None
                }
            },
            _ => None,
        };

        Self { primary, fallback }
    }

    pub fn fallback(&self) -> Arc<TfIdfFallback> {
        self.fallback.clone()
    }
}

impl EmbeddingProvider for DegradingProvider {
    fn encode(&self, text: &str) -> EngramResult<Vec<f32>> {
        if let Some(primary) = &self.primary {
            match primary.encode(text) {
                Ok(vector) => return Ok(vector),
                Err(e) => {
                    warn!(provider = primary.name(), error = %e, "primary embedding provider failed, degrading to local fallback");
                }
            }
        }
        self.fallback.encode(text)
    }

    fn name(&self) -> &str {
        self.primary.as_ref().map(|p| p.name()).unwrap_or_else(|| self.fallback.name())
    }

    fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_provider_config_never_touches_network() {
        let mut config = EmbeddingConfig::default();
        config.provider = "local".to_string();
        let provider = DegradingProvider::from_config(&config);
        assert_eq!(provider.name(), "tfidf-local");
        let vector = provider.encode("hello").unwrap();
        assert_eq!(vector.len(), config.dimensions);
    }

    #[test]
    fn unset_openai_key_degrades_to_local_at_construction() {
        std::env::remove_var("OPENAI_API_KEY");
        let mut config = EmbeddingConfig::default();
        config.provider = "openai".to_string();
        let provider = DegradingProvider::from_config(&config);
        assert_eq!(provider.name(), "tfidf-local");
    }
}
