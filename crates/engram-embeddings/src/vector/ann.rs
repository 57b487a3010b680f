//! HNSW-backed ANN vector store — the primary backend (spec §4.2). Persists
//! its graph to disk so a restarted `Brain` doesn't have to re-embed every
//! node, and keeps a small id-mapping sidecar since `hnsw_rs` only knows
//! about opaque `usize` ids, never our string node ids.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use hnsw_rs::dist::DistCosine;
use hnsw_rs::hnsw::Hnsw;
use hnsw_rs::hnswio::HnswIo;
use serde::{Deserialize, Serialize};

use engram_core::errors::{EmbeddingError, EngramResult};

use super::{VectorMatch, VectorStore};

const MAX_NB_CONNECTION: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 64;
const DUMP_BASENAME: &str = "engram_vectors";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IdMapping {
    node_id_to_hnsw: HashMap<String, usize>,
    hnsw_to_node_id: HashMap<usize, String>,
}

/// Wraps `hnsw_rs::Hnsw<f32, DistCosine>`. The index itself is append-mostly
/// (hnsw_rs has no true delete); deletes are handled by dropping the id from
/// the mapping so it never surfaces in `query` results, and get swept out on
/// the next full rebuild (spec §9 open question: "HNSW doesn't support
/// true deletion" — tombstone-by-mapping is the accepted answer, see
/// DESIGN.md).
pub struct AnnStore {
    index: RwLock<Hnsw<'static, f32, DistCosine>>,
    mapping: RwLock<IdMapping>,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    next_id: AtomicUsize,
    dir: PathBuf,
    dirty: std::sync::atomic::AtomicBool,
}

fn max_layer_for(max_elements: usize) -> usize {
    ((max_elements as f64).log2().ceil() as usize).clamp(4, 16)
}

impl AnnStore {
    /// Builds a fresh, empty index capped at `max_elements` vectors.
    /// `max_elements` is advisory sizing for the graph's layer count, not a
    /// hard ceiling on inserts.
    pub fn new_empty(dir: impl AsRef<Path>, max_elements: usize) -> Self {
        let index = Hnsw::new(MAX_NB_CONNECTION, max_elements, max_layer_for(max_elements), EF_CONSTRUCTION, DistCosine {});
        Self {
            index: RwLock::new(index),
            mapping: RwLock::new(IdMapping::default()),
            vectors: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
            dir: dir.as_ref().to_path_buf(),
            dirty: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Opens a previously-dumped index from `dir`, or returns
    /// `BackendInitFailed` if nothing was dumped there yet / the dump is
    /// unreadable. The caller (`store::SelectingVectorStore`) treats any
    /// error here as "fall back to brute-force", so it's safe to be strict.
    pub fn open(dir: impl AsRef<Path>, max_elements: usize) -> EngramResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mapping_path = dir.join(format!("{DUMP_BASENAME}.mapping.bin"));

        if !mapping_path.exists() {
            return Err(EmbeddingError::BackendInitFailed(format!(
                "no ann index dump found at {}",
                dir.display()
            ))
            .into());
        }

        let mapping_bytes = fs::read(&mapping_path).map_err(|e| {
            EmbeddingError::BackendInitFailed(format!("failed to read ann id mapping: {e}"))
        })?;
        let mapping: IdMapping = bincode::deserialize(&mapping_bytes).map_err(|e| {
            EmbeddingError::BackendInitFailed(format!("corrupt ann id mapping: {e}"))
        })?;

        let vectors_path = dir.join(format!("{DUMP_BASENAME}.vectors.bin"));
        let vectors_bytes = fs::read(&vectors_path).map_err(|e| {
            EmbeddingError::BackendInitFailed(format!("failed to read ann vector cache: {e}"))
        })?;
        let vectors: HashMap<String, Vec<f32>> = bincode::deserialize(&vectors_bytes).map_err(|e| {
            EmbeddingError::BackendInitFailed(format!("corrupt ann vector cache: {e}"))
        })?;

        let reloader = HnswIo::new(&dir, DUMP_BASENAME);
        let index: Hnsw<f32, DistCosine> = reloader
            .load_hnsw()
            .map_err(|e| EmbeddingError::BackendInitFailed(format!("failed to load hnsw graph: {e}")))?;

        let next_id = mapping.hnsw_to_node_id.keys().max().map(|m| m + 1).unwrap_or(0);

        Ok(Self {
            index: RwLock::new(index),
            mapping: RwLock::new(mapping),
            vectors: RwLock::new(vectors),
            next_id: AtomicUsize::new(next_id),
            dir,
            dirty: std::sync::atomic::AtomicBool::new(false),
        })
    }
}

impl VectorStore for AnnStore {
    fn upsert(&mut self, node_id: &str, vector: &[f32]) -> EngramResult<()> {
        let hnsw_id = {
            let mut mapping = self.mapping.write().expect("ann mapping lock poisoned");
            if let Some(existing) = mapping.node_id_to_hnsw.get(node_id) {
                *existing
            } else {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                mapping.node_id_to_hnsw.insert(node_id.to_string(), id);
                mapping.hnsw_to_node_id.insert(id, node_id.to_string());
                id
            }
        };

        self.index.read().expect("ann index lock poisoned").insert((vector, hnsw_id));
        self.vectors.write().expect("ann vector cache lock poisoned").insert(node_id.to_string(), vector.to_vec());
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&mut self, node_id: &str) -> EngramResult<()> {
        let mut mapping = self.mapping.write().expect("ann mapping lock poisoned");
        if let Some(hnsw_id) = mapping.node_id_to_hnsw.remove(node_id) {
            mapping.hnsw_to_node_id.remove(&hnsw_id);
            self.vectors.write().expect("ann vector cache lock poisoned").remove(node_id);
            self.dirty.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.mapping.read().expect("ann mapping lock poisoned").node_id_to_hnsw.len()
    }

    fn get(&self, ids: &[String]) -> Vec<(String, Vec<f32>)> {
        let vectors = self.vectors.read().expect("ann vector cache lock poisoned");
        ids.iter().filter_map(|id| vectors.get(id).map(|v| (id.clone(), v.clone()))).collect()
    }

    fn query(&self, query: &[f32], k: usize) -> EngramResult<Vec<VectorMatch>> {
        let mapping = self.mapping.read().expect("ann mapping lock poisoned");
        let neighbours = self.index.read().expect("ann index lock poisoned").search(query, k, EF_SEARCH);

        let matches = neighbours
            .into_iter()
            .filter_map(|n| {
                mapping
                    .hnsw_to_node_id
                    .get(&n.d_id)
                    .map(|node_id| VectorMatch { node_id: node_id.clone(), similarity: 1.0 - n.distance as f64 })
            })
            .collect();

        Ok(matches)
    }

    fn flush(&self) -> EngramResult<()> {
        if !self.dirty.load(Ordering::SeqCst) {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).map_err(|e| {
            EmbeddingError::BackendQueryFailed(format!("failed to create ann index directory: {e}"))
        })?;

        self.index
            .read()
            .expect("ann index lock poisoned")
            .file_dump(&self.dir, DUMP_BASENAME)
            .map_err(|e| EmbeddingError::BackendQueryFailed(format!("failed to dump hnsw graph: {e}")))?;

        let mapping_bytes = bincode::serialize(&*self.mapping.read().expect("ann mapping lock poisoned"))
            .map_err(|e| EmbeddingError::BackendQueryFailed(format!("failed to serialize ann id mapping: {e}")))?;
        fs::write(self.dir.join(format!("{DUMP_BASENAME}.mapping.bin")), mapping_bytes)
            .map_err(|e| EmbeddingError::BackendQueryFailed(format!("failed to write ann id mapping: {e}")))?;

        let vector_bytes = bincode::serialize(&*self.vectors.read().expect("ann vector cache lock poisoned"))
            .map_err(|e| EmbeddingError::BackendQueryFailed(format!("failed to serialize ann vector cache: {e}")))?;
        fs::write(self.dir.join(format!("{DUMP_BASENAME}.vectors.bin")), vector_bytes)
            .map_err(|e| EmbeddingError::BackendQueryFailed(format!("failed to write ann vector cache: {e}")))?;

        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }
}
