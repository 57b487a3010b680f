//! # engram-retrieval
//!
//! Hybrid retrieval (C5): BM25 keyword search, ANN semantic search, graph
//! spreading activation, and result fusion, behind the single `retrieve()`
//! entry point spec §4.5 describes — plus the two passthroughs the facade
//! also needs, `expand_nodes` (progressive disclosure) and
//! `search_by_embedding` (pure ANN lookup, no activation or reinforcement).

pub mod activation;
pub mod output;
pub mod params;
pub mod seed;

use std::cmp::Ordering;

use engram_core::config::RetrievalConfig;
use engram_core::errors::EngramResult;
use engram_core::Node;
use engram_embeddings::vector::{VectorMatch, VectorStore};
use engram_graph::Graph;

pub use output::{CompactResult, Connection, Direction, FullResult, RetrievalResult};
pub use params::{resolve_since, RetrieveParams, SortBy};

/// The `retrieve()` entry point (spec §4.5): seed → filter → sort →
/// reinforce → shape output.
pub fn retrieve(
    graph: &Graph,
    vector_store: Option<&dyn VectorStore>,
    params: &RetrieveParams,
    config: &RetrievalConfig,
) -> EngramResult<Vec<RetrievalResult>> {
    let scores = seed::build_seed_scores(graph, vector_store, params, config)?;
    let mut ids: Vec<String> = scores.keys().cloned().collect();

    if let Some(since) = &params.since {
        let resolved = resolve_since(since, chrono::Utc::now())?;
        ids = graph.storage().filter_ids_since(&ids, &resolved.to_rfc3339())?;
    }
    if let Some(labels) = &params.labels {
        if !labels.is_empty() {
            ids = graph.storage().filter_ids_with_any_label(&ids, labels)?;
        }
    }
    if let Some(author) = &params.author {
        if !author.is_empty() {
            ids = graph.storage().filter_ids_by_author_contains(&ids, author)?;
        }
    }

    let mut scored_nodes: Vec<(Node, f64)> = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(node) = graph.get_node(id)? {
            let score = *scores.get(id).unwrap_or(&0.0);
            scored_nodes.push((node, score));
        }
    }

    match params.sort_by {
        SortBy::Score => scored_nodes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)),
        SortBy::Date => scored_nodes.sort_by(|a, b| b.0.memory.created_at.cmp(&a.0.memory.created_at)),
    }
    scored_nodes.truncate(params.top_k);

    if params.reinforce {
        let now = chrono::Utc::now();
        for (node, _) in scored_nodes.iter_mut().take(config.reinforce_top_n) {
            node.memory.reinforce(now);
            graph.storage().upsert_node(node)?;
        }
    }

    scored_nodes
        .iter()
        .map(|(node, score)| shape_result(graph, node, *score, params.compact))
        .collect()
}

fn shape_result(graph: &Graph, node: &Node, score: f64, compact: bool) -> EngramResult<RetrievalResult> {
    if compact {
        Ok(RetrievalResult::Compact(output::compact_result(node, score)))
    } else {
        Ok(RetrievalResult::Full(output::full_result(graph, node, score)?))
    }
}

/// Full records for a fixed set of ids — the second half of progressive
/// disclosure after a `compact` retrieve (spec §4.5 "Progressive
/// disclosure"). Missing ids are silently skipped. Scores are not
/// meaningful outside a ranked retrieval, so every record gets `1.0`.
pub fn expand_nodes(graph: &Graph, ids: &[String]) -> EngramResult<Vec<FullResult>> {
    let mut results = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(node) = graph.get_node(id)? {
            results.push(output::full_result(graph, &node, 1.0)?);
        }
    }
    Ok(results)
}

/// Pure ANN lookup with no spreading activation, filters, or reinforcement
/// — the facade's direct `search_by_embedding` passthrough.
pub fn search_by_embedding(
    graph: &Graph,
    vector_store: &dyn VectorStore,
    query_embedding: &[f32],
    top_k: usize,
) -> EngramResult<Vec<RetrievalResult>> {
    let matches: Vec<VectorMatch> = vector_store.query(query_embedding, top_k)?;
    let mut results = Vec::with_capacity(matches.len());
    for m in matches {
        if let Some(node) = graph.get_node(&m.node_id)? {
            results.push(RetrievalResult::Full(output::full_result(graph, &node, m.similarity)?));
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{Edge, EdgeType, LabelSet, MemoryState};
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn memory_node(id: &str, title: &str, content: &str, labels: &[&str]) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(title));
        properties.insert("content".to_string(), Value::from(content));
        properties.insert("summary".to_string(), Value::from(content));
        Node {
            id: id.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect::<LabelSet>(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.01),
        }
    }

    #[test]
    fn temporal_only_retrieve_returns_all_recent_nodes() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "First", "alpha beta", &["Episode"]))
            .unwrap();

        let config = RetrievalConfig::default();
        let mut params = RetrieveParams::from_config(&config);
        params.since = Some("7d".to_string());

        let results = retrieve(&graph, None, &params, &config).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), "n1");
    }

    #[test]
    fn keyword_only_retrieve_finds_match_via_fts_or_like() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "Token Refresh Flow", "details about refreshing tokens", &["Pattern"]))
            .unwrap();
        graph
            .add_node_raw(memory_node("n2", "Unrelated", "nothing to do with auth", &["Pattern"]))
            .unwrap();

        let config = RetrievalConfig::default();
        let mut params = RetrieveParams::from_config(&config);
        params.query = Some("token refresh".to_string());
        params.reinforce = false;

        let results = retrieve(&graph, None, &params, &config).unwrap();
        assert!(results.iter().any(|r| r.id() == "n1"));
    }

    #[test]
    fn labels_filter_excludes_non_matching_nodes() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "Commit one", "fix bug", &["Commit"]))
            .unwrap();
        graph
            .add_node_raw(memory_node("n2", "Pattern one", "fix bug pattern", &["Pattern"]))
            .unwrap();

        let config = RetrievalConfig::default();
        let mut params = RetrieveParams::from_config(&config);
        params.query = Some("fix bug".to_string());
        params.labels = Some(vec!["Pattern".to_string()]);
        params.reinforce = false;

        let results = retrieve(&graph, None, &params, &config).unwrap();
        assert!(results.iter().all(|r| r.id() != "n1"));
    }

    #[test]
    fn reinforce_bumps_access_count_on_survivors() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "Reinforced", "content to reinforce", &["Episode"]))
            .unwrap();

        let config = RetrievalConfig::default();
        let mut params = RetrieveParams::from_config(&config);
        params.query = Some("reinforce".to_string());

        let before = graph.get_node("n1").unwrap().unwrap().memory.access_count;
        retrieve(&graph, None, &params, &config).unwrap();
        let after = graph.get_node("n1").unwrap().unwrap().memory.access_count;
        assert!(after > before);
    }

    #[test]
    fn reinforce_false_does_not_mutate() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "Untouched", "content should not change", &["Episode"]))
            .unwrap();

        let config = RetrievalConfig::default();
        let mut params = RetrieveParams::from_config(&config);
        params.query = Some("untouched".to_string());
        params.reinforce = false;

        let before = graph.get_node("n1").unwrap().unwrap().memory.access_count;
        retrieve(&graph, None, &params, &config).unwrap();
        let after = graph.get_node("n1").unwrap().unwrap().memory.access_count;
        assert_eq!(after, before);
    }

    #[test]
    fn compact_results_carry_no_connections() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "Compact Me", "content for compact view", &["Episode"]))
            .unwrap();

        let config = RetrievalConfig::default();
        let mut params = RetrieveParams::from_config(&config);
        params.query = Some("compact".to_string());
        params.compact = true;
        params.reinforce = false;

        let results = retrieve(&graph, None, &params, &config).unwrap();
        assert!(matches!(results[0], RetrievalResult::Compact(_)));
    }

    #[test]
    fn expand_nodes_returns_full_records_for_requested_ids() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(memory_node("n1", "Expand Me", "full content here", &["Episode"]))
            .unwrap();
        graph
            .add_edge(Edge::new("n1", "n1", EdgeType::References, 0.5))
            .ok();

        let expanded = expand_nodes(&graph, &["n1".to_string(), "missing".to_string()]).unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].id, "n1");
    }
}
