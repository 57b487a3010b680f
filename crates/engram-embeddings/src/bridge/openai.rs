//! HTTP-backed embedding provider, selected via `EMBEDDING_PROVIDER=openai`
//! (spec §4.8). Talks to any OpenAI-compatible `/embeddings` endpoint
//! (`OPENAI_BASE_URL` defaults to `https://api.openai.com/v1`).

use reqwest::blocking::Client;
use serde::Deserialize;

use engram_core::errors::{EmbeddingError, EngramResult};
use engram_core::EmbeddingProvider;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Builds a provider from environment variables. Returns `Err` (rather
    /// than panicking) when `OPENAI_API_KEY` is absent, so callers can fall
    /// back to the local provider instead.
    pub fn from_env(dimensions: usize) -> EngramResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            EmbeddingError::BackendInitFailed(
                "OPENAI_API_KEY not set; cannot use the openai embedding provider".to_string(),
            )
        })?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let client = Client::builder().build().map_err(|e| {
            EmbeddingError::BackendInitFailed(format!("failed to build http client: {e}"))
        })?;

        Ok(Self { client, base_url, api_key, model, dimensions })
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn encode(&self, text: &str) -> EngramResult<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "dimensions": self.dimensions,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| EmbeddingError::EncodeFailed {
                provider: self.name().to_string(),
                message: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(EmbeddingError::EncodeFailed {
                provider: self.name().to_string(),
                message: format!("http {}", response.status()),
            }
            .into());
        }

        let parsed: EmbeddingResponse = response.json().map_err(|e| EmbeddingError::EncodeFailed {
            provider: self.name().to_string(),
            message: format!("invalid response body: {e}"),
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EncodeFailed {
                provider: self.name().to_string(),
                message: "empty embeddings response".to_string(),
            })?
            .embedding;

        if embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            }
            .into());
        }

        Ok(embedding)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
