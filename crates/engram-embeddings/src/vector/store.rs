//! Backend selection policy (spec §4.2): "At `load`, try the primary ANN
//! backend. On any init error, fall back to the brute-force backend and log
//! a warning. Migration from fallback to primary must preserve IDs."

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use engram_core::errors::EngramResult;

use super::ann::AnnStore;
use super::brute_force::BruteForceStore;
use super::{VectorMatch, VectorStore};

enum Backend {
    Ann(AnnStore),
    BruteForce(BruteForceStore),
}

/// Owns whichever backend is active and exposes the same [`VectorStore`]
/// surface to callers, regardless of which one that is.
pub struct SelectingVectorStore {
    backend: Backend,
    dir: PathBuf,
}

impl SelectingVectorStore {
    /// Opens the store rooted at `dir`. When `prefer_ann` is set, tries
    /// [`AnnStore::open`] first and falls back to [`BruteForceStore::open`]
    /// on any error; otherwise goes straight to brute-force.
    pub fn open(dir: impl AsRef<Path>, prefer_ann: bool, max_elements: usize) -> EngramResult<Self> {
        let dir = dir.as_ref().to_path_buf();

        if prefer_ann {
            match AnnStore::open(&dir, max_elements) {
                Ok(ann) => {
                    info!(dir = %dir.display(), "ann vector store loaded");
                    return Ok(Self { backend: Backend::Ann(ann), dir });
                }
                Err(e) => {
                    warn!(error = %e, "ann vector store failed to load, falling back to brute-force");
                }
            }
        }

        let brute = BruteForceStore::open(dir.join("brute_force.bin"))?;
        Ok(Self { backend: Backend::BruteForce(brute), dir })
    }

    /// Builds a store with no prior state: an empty ANN index when
    /// `prefer_ann` is set, otherwise an in-memory brute-force store backed
    /// by a fresh archive file.
    pub fn new_empty(dir: impl AsRef<Path>, prefer_ann: bool, max_elements: usize) -> EngramResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        if prefer_ann {
            Ok(Self { backend: Backend::Ann(AnnStore::new_empty(&dir, max_elements)), dir })
        } else {
            let brute = BruteForceStore::open(dir.join("brute_force.bin"))?;
            Ok(Self { backend: Backend::BruteForce(brute), dir })
        }
    }

    /// A scratch store with no on-disk footprint at all — brute-force
    /// backed by an in-memory archive that is never flushed to a file.
    /// Used by `Brain::open_in_memory` and tests.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::BruteForce(BruteForceStore::new_in_memory()),
            dir: PathBuf::new(),
        }
    }

    pub fn is_ann(&self) -> bool {
        matches!(self.backend, Backend::Ann(_))
    }

    /// Rebuilds the store as a fresh ANN index seeded with every vector
    /// currently held by the active (brute-force) backend, preserving node
    /// ids. Used to migrate up from brute-force once the primary backend
    /// becomes available again.
    pub fn migrate_to_ann(&mut self, all_ids: &[String], max_elements: usize) -> EngramResult<()> {
        if self.is_ann() {
            return Ok(());
        }

        let mut ann = AnnStore::new_empty(&self.dir, max_elements);
        for (id, vector) in self.backend_get(all_ids) {
            ann.upsert(&id, &vector)?;
        }
        ann.flush()?;
        self.backend = Backend::Ann(ann);
        Ok(())
    }

    fn backend_get(&self, ids: &[String]) -> Vec<(String, Vec<f32>)> {
        match &self.backend {
            Backend::Ann(s) => s.get(ids),
            Backend::BruteForce(s) => s.get(ids),
        }
    }
}

impl VectorStore for SelectingVectorStore {
    fn upsert(&mut self, node_id: &str, vector: &[f32]) -> EngramResult<()> {
        match &mut self.backend {
            Backend::Ann(s) => s.upsert(node_id, vector),
            Backend::BruteForce(s) => s.upsert(node_id, vector),
        }
    }

    fn delete(&mut self, node_id: &str) -> EngramResult<()> {
        match &mut self.backend {
            Backend::Ann(s) => s.delete(node_id),
            Backend::BruteForce(s) => s.delete(node_id),
        }
    }

    fn count(&self) -> usize {
        match &self.backend {
            Backend::Ann(s) => s.count(),
            Backend::BruteForce(s) => s.count(),
        }
    }

    fn get(&self, ids: &[String]) -> Vec<(String, Vec<f32>)> {
        self.backend_get(ids)
    }

    fn query(&self, query: &[f32], k: usize) -> EngramResult<Vec<VectorMatch>> {
        match &self.backend {
            Backend::Ann(s) => s.query(query, k),
            Backend::BruteForce(s) => s.query(query, k),
        }
    }

    fn flush(&self) -> EngramResult<()> {
        match &self.backend {
            Backend::Ann(s) => s.flush(),
            Backend::BruteForce(s) => s.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_with_prefer_ann_falls_back_to_brute_force() {
        let dir = tempfile::tempdir().unwrap();
        let store = SelectingVectorStore::open(dir.path(), true, 1_000).unwrap();
        assert!(!store.is_ann());
    }

    #[test]
    fn new_empty_with_prefer_ann_creates_an_ann_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = SelectingVectorStore::new_empty(dir.path(), true, 1_000).unwrap();
        assert!(store.is_ann());
    }

    #[test]
    fn migrate_to_ann_preserves_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SelectingVectorStore::new_empty(dir.path(), false, 1_000).unwrap();
        store.upsert("a", &[1.0, 0.0]).unwrap();
        store.upsert("b", &[0.0, 1.0]).unwrap();

        store.migrate_to_ann(&["a".to_string(), "b".to_string()], 1_000).unwrap();
        assert!(store.is_ann());
        assert_eq!(store.count(), 2);
        let results = store.query(&[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].node_id, "a");
    }
}
