//! Model-identity guard (spec §4.8 "switching embedding providers/models
//! invalidates the vector index"). Stamps `(model_name, dimensions)` into
//! storage `meta` on first use and refuses to silently mix vectors from two
//! different models in the same store.

use engram_core::errors::EngramResult;
use engram_storage::StorageEngine;

const META_MODEL_NAME_KEY: &str = "embedding_model_name";
const META_MODEL_DIM_KEY: &str = "embedding_model_dim";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelIdentityOutcome {
    /// No prior model was recorded; the current one was just stamped.
    FirstUse,
    /// The recorded model matches the current one.
    Match,
    /// The recorded model differs from the current one. The caller must
    /// treat the vector store as empty/unusable until it is rebuilt
    /// (spec §4.2 "model-identity guard").
    Mismatch { stored_name: String, stored_dim: usize },
}

/// Checks `(model_name, dimensions)` against what's recorded in `meta`,
/// stamping it on first use. Never errors on mismatch — the caller decides
/// whether to rebuild or refuse, matching the rest of the engine's
/// degrade-in-place error taxonomy for `ModelIncompatibility`.
pub fn check_model_identity(
    storage: &StorageEngine,
    model_name: &str,
    dimensions: usize,
) -> EngramResult<ModelIdentityOutcome> {
    let stored_name = storage.get_meta(META_MODEL_NAME_KEY)?;
    let stored_dim = storage.get_meta(META_MODEL_DIM_KEY)?;

    match (stored_name, stored_dim) {
        (Some(name), Some(dim_str)) => {
            let dim: usize = dim_str.parse().unwrap_or(0);
            if name == model_name && dim == dimensions {
                Ok(ModelIdentityOutcome::Match)
            } else {
                Ok(ModelIdentityOutcome::Mismatch { stored_name: name, stored_dim: dim })
            }
        }
        _ => {
            storage.set_meta(META_MODEL_NAME_KEY, model_name)?;
            storage.set_meta(META_MODEL_DIM_KEY, &dimensions.to_string())?;
            Ok(ModelIdentityOutcome::FirstUse)
        }
    }
}
