//! `Brain` — the facade spec §6 describes as the engine's "Query API".
//! Owns storage, the vector store, and the embedder, and wires ingestion,
//! retrieval, and consolidation on top of the shared [`Graph`].

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::warn;

use engram_core::config::EngramConfig;
use engram_core::errors::{EngramError, EngramResult};
use engram_core::{Edge, EdgeType, EmbeddingProvider, LabelSet, MemoryState, Node};
use engram_embeddings::model_guard::{check_model_identity, ModelIdentityOutcome};
use engram_embeddings::vector::store::SelectingVectorStore;
use engram_embeddings::vector::VectorStore;
use engram_embeddings::{node_embedding_text, DegradingProvider};
use engram_graph::Graph;
use engram_ingest::ast::AstIngestStats;
use engram_ingest::diff::enrich::{enrich_git_diffs, DiffEnrichStats};
use engram_ingest::markdown::{adr, domain, experiences, patterns};
use engram_retrieval::{
    expand_nodes as retrieval_expand_nodes, retrieve as retrieval_retrieve, search_by_embedding as retrieval_search_by_embedding,
    FullResult, RetrievalResult, RetrieveParams,
};
use engram_storage::StorageEngine;

use engram_consolidation::{ConsolidateStats, ConsolidationEngine, HealthReport, SleepCycleReport};
use engram_decay::{DecayEngine, DecayStats};

use crate::dev_state::DevState;
use crate::export::GraphJson;
use crate::stats::BrainStats;

const VECTORS_DIR: &str = "vectors";
const DB_FILE: &str = "brain.db";

/// The organizational memory engine, opened against a base directory (or
/// kept entirely in memory for tests and scratch use).
pub struct Brain {
    base_path: Option<PathBuf>,
    storage: Arc<StorageEngine>,
    graph: Graph,
    vector_store: Mutex<SelectingVectorStore>,
    embedder: DegradingProvider,
    config: EngramConfig,
    consolidation: ConsolidationEngine,
    decay: DecayEngine,
}

impl Brain {
    /// Opens (or creates) a brain rooted at `base_path`: `base_path/brain.db`
    /// for the graph, `base_path/vectors/` for the vector store.
    pub fn open(base_path: impl AsRef<Path>) -> EngramResult<Self> {
        Self::open_with_config(base_path, EngramConfig::default())
    }

    pub fn open_with_config(base_path: impl AsRef<Path>, config: EngramConfig) -> EngramResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let storage = Arc::new(StorageEngine::open(base_path.join(DB_FILE))?);
        let vector_store = SelectingVectorStore::open(
            base_path.join(VECTORS_DIR),
            config.embedding.prefer_ann,
            ann_capacity(&storage)?,
        )?;
        Ok(Self::assemble(Some(base_path), storage, vector_store, config))
    }

    /// An entirely in-memory brain: no file on disk, no vector persistence.
    /// Used by tests and by callers that want a disposable scratch graph.
    pub fn open_in_memory() -> EngramResult<Self> {
        Self::open_in_memory_with_config(EngramConfig::default())
    }

    pub fn open_in_memory_with_config(config: EngramConfig) -> EngramResult<Self> {
        let storage = Arc::new(StorageEngine::open_in_memory()?);
        let vector_store = SelectingVectorStore::new_in_memory();
        Ok(Self::assemble(None, storage, vector_store, config))
    }

    fn assemble(
        base_path: Option<PathBuf>,
        storage: Arc<StorageEngine>,
        vector_store: SelectingVectorStore,
        config: EngramConfig,
    ) -> Self {
        let graph = Graph::new(storage.clone());
        let embedder = DegradingProvider::from_config(&config.embedding);
        let consolidation = ConsolidationEngine::new(config.consolidation.clone());
        let decay = DecayEngine::new(config.decay.clone());
        Self {
            base_path,
            storage,
            graph,
            vector_store: Mutex::new(vector_store),
            embedder,
            config,
            consolidation,
            decay,
        }
    }

    pub fn config(&self) -> &EngramConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    // ── lifecycle ──

    /// Flushes the vector store and checkpoints the WAL back into the main
    /// database file. Safe to call repeatedly.
    pub fn save(&self) -> EngramResult<()> {
        self.vector_store.lock().unwrap().flush()?;
        self.storage.checkpoint()
    }

    /// `save()` plus releasing the handle. `Brain` has no background
    /// threads to stop, so this is just an explicit, scoped-resource-style
    /// alias for callers that want a `close()` step in their lifecycle.
    pub fn close(self) -> EngramResult<()> {
        self.save()
    }

    // ── C3: graph API passthroughs ──

    /// The full encoding pipeline (spec §5 ordering): node upsert → label
    /// set → embedding upsert → author edge → reference edges → domain
    /// edge. `embedding`, if given, is stored as-is; otherwise the brain
    /// encodes `title + content + labels` through its embedder.
    pub fn add_memory(
        &self,
        title: &str,
        content: &str,
        labels: LabelSet,
        author: &str,
        props: Option<Map<String, Value>>,
        references: &[String],
        embedding: Option<Vec<f32>>,
    ) -> EngramResult<String> {
        let id = self.graph.upsert_memory_node(title, content, labels, props)?;

        if let Some(node) = self.graph.get_node(&id)? {
            self.embed_node(&node, embedding)?;
        }

        self.graph.link_authored_by(&id, author)?;
        self.graph.link_references(&id, content, references)?;
        self.graph.link_domain(&id, content)?;
        Ok(id)
    }

    /// Computes (or accepts) and stores a node's embedding, honoring the
    /// model-identity guard (spec §4.2, §4.8): a provider/dimension switch
    /// never silently mixes vectors, it just skips the upsert and warns.
    fn embed_node(&self, node: &Node, embedding: Option<Vec<f32>>) -> EngramResult<()> {
        let outcome = check_model_identity(&self.storage, self.embedder.name(), self.embedder.dimensions())?;
        if let ModelIdentityOutcome::Mismatch { stored_name, stored_dim } = outcome {
            warn!(
                stored_name,
                stored_dim,
                current_name = self.embedder.name(),
                current_dim = self.embedder.dimensions(),
                "embedding model identity changed; refusing to store a mismatched vector until rebuild"
            );
            return Ok(());
        }

        let vector = match embedding {
            Some(v) => v,
            None => {
                let text = node_embedding_text(node, self.config.embedding.content_chars);
                self.embedder.encode(&text)?
            }
        };

        let mut store = self.vector_store.lock().unwrap();
        store.upsert(&node.id, &vector)?;
        store.flush()?;
        Ok(())
    }

    pub fn add_edge(
        &self,
        src: &str,
        tgt: &str,
        edge_type: EdgeType,
        weight: Option<f64>,
        props: Option<Map<String, Value>>,
    ) -> EngramResult<()> {
        let mut edge = Edge::new(src, tgt, edge_type, weight.unwrap_or_else(|| edge_type.default_weight()));
        if let Some(props) = props {
            edge.properties = props;
        }
        self.graph.add_edge(edge)
    }

    /// Bypass for synthetic nodes (`Theme`, `PatternCluster`, ...) — no
    /// author resolution, no domain inference, no reference scan.
    pub fn add_node_raw(&self, id: &str, labels: LabelSet, props: Map<String, Value>, memory: MemoryState) -> EngramResult<()> {
        self.graph.add_node_raw(Node {
            id: id.to_string(),
            labels,
            properties: props,
            memory,
        })
    }

    pub fn remove_node(&self, id: &str) -> EngramResult<bool> {
        self.vector_store.lock().unwrap().delete(id).ok();
        self.graph.remove_node(id)
    }

    pub fn get_node(&self, id: &str) -> EngramResult<Option<Node>> {
        self.graph.get_node(id)
    }

    pub fn get_all_nodes(&self) -> EngramResult<Vec<Node>> {
        self.graph.get_all_nodes()
    }

    pub fn get_by_label(&self, label: &str) -> EngramResult<Vec<Node>> {
        self.graph.get_by_label(label)
    }

    pub fn get_neighbors(&self, id: &str, edge_type: Option<EdgeType>) -> EngramResult<Vec<Node>> {
        self.graph.get_neighbors(id, edge_type)
    }

    pub fn get_predecessors(&self, id: &str, edge_type: Option<EdgeType>) -> EngramResult<Vec<Node>> {
        self.graph.get_predecessors(id, edge_type)
    }

    pub fn get_edges_by_type(&self, edge_type: EdgeType) -> EngramResult<Vec<Edge>> {
        self.graph.get_edges_by_type(edge_type)
    }

    /// `has_edge(src, tgt, type?)`: with a type, checks that specific
    /// triple; without one, whether any edge at all connects `src -> tgt`.
    pub fn has_edge(&self, src: &str, tgt: &str, edge_type: Option<EdgeType>) -> EngramResult<bool> {
        match edge_type {
            Some(t) => self.graph.has_edge(src, tgt, t),
            None => Ok(self.storage.outgoing_edges(src)?.into_iter().any(|e| e.to_id == tgt)),
        }
    }

    /// `get_edge(src, tgt, type?)`: with a type, that specific edge; without
    /// one, the first edge found connecting `src -> tgt` (multi-edges are
    /// differentiated only by type, so "first" is deterministic per type
    /// but arbitrary across types when `type` is omitted).
    pub fn get_edge(&self, src: &str, tgt: &str, edge_type: Option<EdgeType>) -> EngramResult<Option<Edge>> {
        match edge_type {
            Some(t) => self.graph.get_edge(src, tgt, t),
            None => Ok(self.storage.outgoing_edges(src)?.into_iter().find(|e| e.to_id == tgt)),
        }
    }

    pub fn degree(&self, id: &str) -> EngramResult<usize> {
        self.graph.degree(id)
    }

    // ── C5: retrieval ──

    pub fn retrieve(&self, params: &RetrieveParams) -> EngramResult<Vec<RetrievalResult>> {
        let store = self.vector_store.lock().unwrap();
        let vs: Option<&dyn VectorStore> = Some(&*store as &dyn VectorStore);
        retrieval_retrieve(&self.graph, vs, params, &self.config.retrieval)
    }

    pub fn expand_nodes(&self, ids: &[String]) -> EngramResult<Vec<FullResult>> {
        retrieval_expand_nodes(&self.graph, ids)
    }

    pub fn spreading_activation(&self, seeds: &[String], max_depth: u32, decay: f64) -> EngramResult<HashMap<String, f64>> {
        engram_retrieval::activation::spreading_activation(&self.graph, seeds, max_depth, decay)
    }

    pub fn search_by_embedding(&self, query_embedding: &[f32], top_k: usize) -> EngramResult<Vec<RetrievalResult>> {
        let store = self.vector_store.lock().unwrap();
        retrieval_search_by_embedding(&self.graph, &*store, query_embedding, top_k)
    }

    /// Encodes `query` through the brain's embedder and runs
    /// `search_by_embedding` against the result — the "embeddings search
    /// <q>" CLI operation's underlying primitive (spec §6).
    pub fn search_by_text(&self, query: &str, top_k: usize) -> EngramResult<Vec<RetrievalResult>> {
        let embedding = self.embedder.encode(query)?;
        self.search_by_embedding(&embedding, top_k)
    }

    // ── C6/C7: sleep, consolidation, decay, health ──

    pub fn consolidate(&self) -> EngramResult<ConsolidateStats> {
        self.consolidation.consolidate(&self.graph)
    }

    pub fn apply_decay(&self) -> EngramResult<DecayStats> {
        self.decay.apply_decay(&self.graph, Utc::now())
    }

    pub fn sleep_cycle(&self, phases: &[String]) -> SleepCycleReport {
        let store = self.vector_store.lock().unwrap();
        let vs: Option<&dyn VectorStore> = Some(&*store as &dyn VectorStore);
        self.consolidation.sleep_cycle(&self.graph, vs, phases)
    }

    pub fn health(&self) -> EngramResult<HealthReport> {
        let store = self.vector_store.lock().unwrap();
        let vs: Option<&dyn VectorStore> = Some(&*store as &dyn VectorStore);
        self.consolidation.health(&self.graph, vs)
    }

    // ── C2/C8: embeddings ──

    /// Backfills a vector for every node that doesn't have one yet, the
    /// "embeddings build" CLI operation's underlying primitive. Returns the
    /// number of nodes embedded.
    pub fn build_embeddings(&self) -> EngramResult<usize> {
        let nodes = self.graph.get_all_nodes()?;
        let mut store = self.vector_store.lock().unwrap();
        let existing_ids: BTreeSet<String> = store.get(&nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>())
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let outcome = check_model_identity(&self.storage, self.embedder.name(), self.embedder.dimensions())?;
        if let ModelIdentityOutcome::Mismatch { .. } = outcome {
            warn!("embedding model identity changed; run a rebuild before building embeddings");
            return Ok(0);
        }

        let mut embedded = 0;
        for node in &nodes {
            if existing_ids.contains(&node.id) {
                continue;
            }
            let text = node_embedding_text(node, self.config.embedding.content_chars);
            let vector = self.embedder.encode(&text)?;
            store.upsert(&node.id, &vector)?;
            embedded += 1;
        }
        store.flush()?;
        Ok(embedded)
    }

    /// Migrates the active vector store from brute-force to ANN, preserving
    /// ids (spec §4.2 "Migration from fallback to primary must preserve
    /// IDs"). A no-op if ANN is already active.
    pub fn migrate_embeddings(&self) -> EngramResult<()> {
        let all_ids: Vec<String> = self.graph.get_all_nodes()?.into_iter().map(|n| n.id).collect();
        let mut store = self.vector_store.lock().unwrap();
        store.migrate_to_ann(&all_ids, ann_capacity(&self.storage)?)
    }

    pub fn vector_backend_name(&self) -> &'static str {
        if self.vector_store.lock().unwrap().is_ann() {
            "chromadb"
        } else {
            "npz"
        }
    }

    // ── C4: ingestion passthroughs ──

    pub fn ingest_adrs(&self, content: &str) -> EngramResult<usize> {
        adr::ingest_adr_log(&self.graph, content)
    }

    pub fn ingest_domain(&self, content: &str) -> EngramResult<usize> {
        domain::ingest_domain(&self.graph, content)
    }

    pub fn ingest_patterns(&self, content: &str) -> EngramResult<usize> {
        patterns::ingest_patterns(&self.graph, content)
    }

    pub fn ingest_experiences(&self, content: &str) -> EngramResult<usize> {
        experiences::ingest_experiences(&self.graph, content)
    }

    pub fn ingest_git_log(&self, repo_path: &Path, max_commits: usize) -> EngramResult<usize> {
        engram_ingest::git::ingest_git_log(&self.graph, repo_path, max_commits, &self.config.ingest)
    }

    pub fn enrich_diffs(&self, repo_path: &Path, max_commits: usize) -> EngramResult<DiffEnrichStats> {
        enrich_git_diffs(&self.graph, repo_path, &self.config.ingest, max_commits)
    }

    pub fn ingest_ast(&self, root: &Path, languages: &[&str]) -> EngramResult<AstIngestStats> {
        engram_ingest::scan_and_ingest_ast(&self.graph, root, &self.config.ingest, languages)
    }

    // ── dev state ──

    pub fn get_dev_state(&self, email: &str) -> EngramResult<Option<DevState>> {
        DevState::load(&self.graph, email)
    }

    pub fn update_dev_state(
        &self,
        email: &str,
        focus: Option<&str>,
        last_session: Option<&str>,
        name: Option<&str>,
    ) -> EngramResult<String> {
        DevState::update(&self.graph, email, focus, last_session, name)
    }

    // ── stats & export ──

    pub fn get_stats(&self) -> EngramResult<BrainStats> {
        BrainStats::collect(self)
    }

    pub(crate) fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub(crate) fn vector_count(&self) -> usize {
        self.vector_store.lock().unwrap().count()
    }

    /// Exports the whole graph as a diffable `graph.json` snapshot (spec
    /// §6 wire-level state). Defaults to `<base_path>/graph.json` when no
    /// explicit path is given and the brain was opened against a
    /// directory; an in-memory brain with no `path` given is a usage
    /// error, since there's nowhere sensible to default to.
    pub fn export_json(&self, path: Option<&Path>) -> EngramResult<PathBuf> {
        let target = match (path, &self.base_path) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(base)) => base.join("graph.json"),
            (None, None) => return Err(EngramError::UsageError("export_json needs an explicit path for an in-memory brain".into())),
        };

        let snapshot = self.storage.export_snapshot()?;
        let backend = self.vector_backend_name();
        let doc = GraphJson::from_snapshot(&snapshot, backend);
        let json = serde_json::to_string_pretty(&doc)?;
        std::fs::write(&target, json).map_err(|e| EngramError::UsageError(format!("writing {}: {e}", target.display())))?;
        Ok(target)
    }
}

/// Sizes the ANN index to roughly 4x the current node count (min 1024), so
/// a fresh brain doesn't need a rebuild the moment it crosses a few hundred
/// nodes, without over-allocating for a brand new one.
fn ann_capacity(storage: &StorageEngine) -> EngramResult<usize> {
    let count = storage.all_nodes()?.len();
    Ok((count * 4).max(1024))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::LabelSet;

    fn labels(names: &[&str]) -> LabelSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_memory_embeds_and_links_in_order() {
        let brain = Brain::open_in_memory().unwrap();
        let id = brain
            .add_memory(
                "Use SQLite for storage",
                "We chose SQLite for the property graph backend.",
                labels(&["Decision"]),
                "jane@example.com",
                None,
                &[],
                None,
            )
            .unwrap();

        let node = brain.get_node(&id).unwrap().unwrap();
        assert!(node.has_label("Decision"));
        assert!(brain
            .get_neighbors(&id, Some(EdgeType::AuthoredBy))
            .unwrap()
            .iter()
            .any(|n| n.has_label("Person")));
        assert_eq!(brain.vector_count(), 1);
    }

    #[test]
    fn retrieve_finds_ingested_memory() {
        let brain = Brain::open_in_memory().unwrap();
        brain
            .add_memory(
                "Token refresh flow",
                "Details about refreshing OAuth tokens safely.",
                labels(&["Pattern"]),
                "",
                None,
                &[],
                None,
            )
            .unwrap();

        let mut params = RetrieveParams::from_config(&brain.config().retrieval);
        params.query = Some("token refresh".to_string());
        params.reinforce = false;

        let results = brain.retrieve(&params).unwrap();
        assert!(!results.is_empty());
    }

    #[test]
    fn export_json_round_trips_into_a_fresh_storage_engine() {
        let brain = Brain::open_in_memory().unwrap();
        brain
            .add_memory("Exportable", "content to export", labels(&["Concept"]), "", None, &[], None)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        brain.export_json(Some(&path)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let doc: GraphJson = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.meta.node_count, brain.get_all_nodes().unwrap().len());
    }

    #[test]
    fn remove_node_drops_its_edges() {
        let brain = Brain::open_in_memory().unwrap();
        let a = brain
            .add_memory("A", "content a", labels(&["Pattern"]), "", None, &[], None)
            .unwrap();
        let b = brain
            .add_memory("B", "content b", labels(&["Pattern"]), "", None, &[], None)
            .unwrap();
        brain.add_edge(&a, &b, EdgeType::RelatedTo, Some(0.8), None).unwrap();

        assert!(brain.remove_node(&a).unwrap());
        assert!(brain.get_edges_by_type(EdgeType::RelatedTo).unwrap().is_empty());
    }

    #[test]
    fn model_identity_switch_skips_the_vector_upsert() {
        let brain = Brain::open_in_memory().unwrap();
        let id = brain
            .add_memory("First", "content", labels(&["Episode"]), "", None, &[], None)
            .unwrap();
        assert_eq!(brain.vector_count(), 1);

        // Stamp a different model identity directly, simulating a provider swap.
        brain.storage().set_meta("embedding_model_name", "some-other-model").unwrap();
        brain
            .add_memory("Second", "more content", labels(&["Episode"]), "", None, &[], None)
            .unwrap();

        // The second node's vector was refused; only the first is indexed.
        assert_eq!(brain.vector_count(), 1);
        let _ = id;
    }
}
