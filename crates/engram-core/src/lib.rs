//! # engram-core
//!
//! Shared types, error taxonomy, and configuration for the Engram
//! organizational memory engine: the graph's `Node`/`Edge`/`EdgeType`
//! vocabulary, deterministic ID derivation, and the `EmbeddingProvider`
//! seam every other crate builds on.

pub mod config;
pub mod errors;
pub mod model;
pub mod traits;

pub use config::EngramConfig;
pub use errors::{EngramError, EngramResult};
pub use model::{
    code_node_id, compact_type, decay_rate_for_labels, derive_summary, is_archive_protected,
    node_id, Edge, EdgeType, Label, LabelSet, MemoryState, Node,
};
pub use traits::EmbeddingProvider;
