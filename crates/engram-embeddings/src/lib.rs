//! # engram-embeddings
//!
//! Vector store backends (C2) and the pluggable embedding bridge (C8) for
//! the Engram memory engine. The engine never computes embeddings itself —
//! it only calls into an [`EmbeddingProvider`](engram_core::EmbeddingProvider)
//! and stores/queries the resulting vectors through a [`vector::VectorStore`].

pub mod bridge;
pub mod model_guard;
pub mod vector;

pub use bridge::text_builder::node_embedding_text;
pub use bridge::tfidf::TfIdfFallback;
pub use bridge::DegradingProvider;
pub use model_guard::{check_model_identity, ModelIdentityOutcome};
pub use vector::store::SelectingVectorStore;
pub use vector::{cosine_similarity, VectorMatch, VectorStore};
