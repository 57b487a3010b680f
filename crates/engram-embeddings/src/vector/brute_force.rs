//! Brute-force cosine similarity backend (spec §4.2 "fallback"). O(n) per
//! query, but simple enough to always initialize successfully — the ANN
//! backend can fail to load (corrupt index, unsupported platform) while
//! this one never does, which is why it is the bottom of the fallback
//! chain rather than a peer choice.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use engram_core::errors::{EmbeddingError, EngramResult};

use super::{cosine_similarity, VectorMatch, VectorStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Archive {
    vectors: HashMap<String, Vec<f32>>,
}

/// All vectors held in memory, with the whole archive bincode-dumped to a
/// single file whenever [`VectorStore::flush`] is called.
pub struct BruteForceStore {
    archive: Archive,
    archive_path: Option<PathBuf>,
    dirty: bool,
}

impl BruteForceStore {
    pub fn new_in_memory() -> Self {
        Self { archive: Archive::default(), archive_path: None, dirty: false }
    }

    /// Opens (or creates) a brute-force store backed by `archive_path`. A
    /// missing file starts empty; a present-but-corrupt file is treated as
    /// a backend init failure the caller can log and recover from, since
    /// spec §4.2 never allows a vector store failure to take down
    /// `add_memory`.
    pub fn open(archive_path: impl AsRef<Path>) -> EngramResult<Self> {
        let archive_path = archive_path.as_ref().to_path_buf();
        let archive = match fs::read(&archive_path) {
            Ok(bytes) => bincode::deserialize(&bytes).map_err(|e| {
                EmbeddingError::BackendInitFailed(format!(
                    "corrupt brute-force archive at {}: {e}",
                    archive_path.display()
                ))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Archive::default(),
            Err(e) => {
                return Err(EmbeddingError::BackendInitFailed(format!(
                    "failed to read brute-force archive at {}: {e}",
                    archive_path.display()
                ))
                .into())
            }
        };

        Ok(Self { archive, archive_path: Some(archive_path), dirty: false })
    }
}

impl VectorStore for BruteForceStore {
    fn upsert(&mut self, node_id: &str, vector: &[f32]) -> EngramResult<()> {
        self.archive.vectors.insert(node_id.to_string(), vector.to_vec());
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, node_id: &str) -> EngramResult<()> {
        if self.archive.vectors.remove(node_id).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.archive.vectors.len()
    }

    fn get(&self, ids: &[String]) -> Vec<(String, Vec<f32>)> {
        ids.iter()
            .filter_map(|id| self.archive.vectors.get(id).map(|v| (id.clone(), v.clone())))
            .collect()
    }

    fn query(&self, query: &[f32], k: usize) -> EngramResult<Vec<VectorMatch>> {
        let mut scored: Vec<VectorMatch> = self
            .archive
            .vectors
            .iter()
            .map(|(id, vec)| VectorMatch { node_id: id.clone(), similarity: cosine_similarity(query, vec) })
            .collect();

        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn flush(&self) -> EngramResult<()> {
        let Some(path) = &self.archive_path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let bytes = bincode::serialize(&self.archive).map_err(|e| {
            EmbeddingError::BackendQueryFailed(format!("failed to serialize brute-force archive: {e}"))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EmbeddingError::BackendQueryFailed(format!("failed to create archive directory: {e}"))
            })?;
        }

        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            EmbeddingError::BackendQueryFailed(format!("failed to write brute-force archive: {e}"))
        })?;
        file.write_all(&bytes).map_err(|e| {
            EmbeddingError::BackendQueryFailed(format!("failed to write brute-force archive: {e}"))
        })?;
        fs::rename(&tmp_path, path).map_err(|e| {
            EmbeddingError::BackendQueryFailed(format!("failed to finalize brute-force archive: {e}"))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_query_finds_the_nearest_neighbor() {
        let mut store = BruteForceStore::new_in_memory();
        store.upsert("a", &[1.0, 0.0]).unwrap();
        store.upsert("b", &[0.0, 1.0]).unwrap();

        let results = store.query(&[1.0, 0.1], 1).unwrap();
        assert_eq!(results[0].node_id, "a");
    }

    #[test]
    fn delete_removes_from_subsequent_queries() {
        let mut store = BruteForceStore::new_in_memory();
        store.upsert("a", &[1.0, 0.0]).unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.count(), 0);
        assert!(store.query(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn flush_and_reopen_round_trips_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");

        {
            let mut store = BruteForceStore::open(&path).unwrap();
            store.upsert("a", &[0.5, 0.5, 0.5]).unwrap();
            store.flush().unwrap();
        }

        let reopened = BruteForceStore::open(&path).unwrap();
        assert_eq!(reopened.count(), 1);
        assert_eq!(reopened.get(&["a".to_string()])[0].1, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn missing_archive_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.bin");
        let store = BruteForceStore::open(&path).unwrap();
        assert_eq!(store.count(), 0);
    }
}
