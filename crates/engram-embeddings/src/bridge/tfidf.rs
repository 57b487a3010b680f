//! Local, dependency-free embedding provider: hashing-trick bag-of-words with
//! an L2 normalization pass. This is the provider of last resort — always
//! available, never calls out to the network, and is what keeps
//! `add_memory`/`retrieve` functional on a machine with no model or API key
//! configured (spec §4.8 "local fallback").

use std::sync::atomic::{AtomicUsize, Ordering};

use engram_core::errors::{EmbeddingError, EngramResult};
use engram_core::EmbeddingProvider;

/// Hashes each lowercased token into a bucket in `[0, dimensions)` and
/// accumulates term frequency there, then L2-normalizes the resulting
/// vector. Deterministic and stateless: the same text always yields the
/// same vector, across process restarts.
pub struct TfIdfFallback {
    dimensions: usize,
    calls: AtomicUsize,
}

impl TfIdfFallback {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }

    /// Number of `encode` calls served, for diagnostics.
    pub fn calls_served(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn hash_bucket(&self, token: &str) -> usize {
        // FNV-1a: small, dependency-free, good enough distribution for a
        // fallback provider that only needs to be stable, not adversarially
        // collision-resistant.
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (hash as usize) % self.dimensions
    }
}

impl EmbeddingProvider for TfIdfFallback {
    fn encode(&self, text: &str) -> EngramResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.dimensions == 0 {
            return Err(EmbeddingError::DimensionMismatch { expected: 1, got: 0 }.into());
        }

        let mut vector = vec![0.0f32; self.dimensions];
        let mut token_count = 0usize;

        for token in text.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            token_count += 1;
            let bucket = self.hash_bucket(&token.to_lowercase());
            vector[bucket] += 1.0;
        }

        if token_count == 0 {
            return Ok(vector);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn name(&self) -> &str {
        "tfidf-local"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
