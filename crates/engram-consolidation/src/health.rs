//! Health scoring (spec §4.7 "Health score"): a single number plus
//! actionable recommendations, meant to answer "is this brain okay?".

use engram_core::errors::EngramResult;
use engram_embeddings::VectorStore;
use engram_graph::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    NeedsAttention,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub score: f64,
    pub status: HealthStatus,
    pub total_nodes: usize,
    pub content_nodes: usize,
    pub weak_nodes: usize,
    pub semantic_edges: usize,
    pub embedded_nodes: usize,
    pub code_nodes: usize,
    pub code_node_coverage: f64,
    pub diff_enrichment_pct: f64,
    pub recommendations: Vec<String>,
}

/// `0.3 * (1 - weak/total) + 0.4 * min(1, semantic_edges / content_nodes) +
/// 0.3 * min(1, embeddings / total)`, where `content_nodes = total - #Person
/// - #Domain`. `>= 0.8` healthy, `>= 0.5` needs_attention, else critical.
pub fn compute_health(graph: &Graph, vector_store: Option<&dyn VectorStore>) -> EngramResult<HealthReport> {
    let nodes = graph.storage().all_nodes()?;
    let total_nodes = nodes.len();

    if total_nodes == 0 {
        return Ok(HealthReport {
            score: 1.0,
            status: HealthStatus::Healthy,
            total_nodes: 0,
            content_nodes: 0,
            weak_nodes: 0,
            semantic_edges: 0,
            embedded_nodes: 0,
            code_nodes: 0,
            code_node_coverage: 0.0,
            diff_enrichment_pct: 0.0,
            recommendations: Vec::new(),
        });
    }

    let person_or_domain = nodes.iter().filter(|n| n.has_label("Person") || n.has_label("Domain")).count();
    let content_nodes = total_nodes - person_or_domain;
    let weak_nodes = nodes.iter().filter(|n| n.has_label("WeakMemory")).count();
    let code_nodes = nodes
        .iter()
        .filter(|n| n.has_label("Code") || n.has_label("Module") || n.has_label("Class") || n.has_label("Function") || n.has_label("Interface"))
        .count();

    let commit_nodes: Vec<_> = nodes.iter().filter(|n| n.has_label("Commit")).collect();
    let enriched_commits = commit_nodes.iter().filter(|n| n.properties.contains_key("diff_enriched_at")).count();

    let semantic_edges = engram_core::EdgeType::ALL
        .into_iter()
        .filter(|t| t.is_semantic())
        .map(|t| graph.storage().edges_by_type(t).map(|edges| edges.len()))
        .collect::<EngramResult<Vec<usize>>>()?
        .into_iter()
        .sum::<usize>();

    let embedded_nodes = match vector_store {
        Some(store) => store.count(),
        None => 0,
    };

    let weak_term = 1.0 - (weak_nodes as f64 / total_nodes as f64);
    let semantic_term = if content_nodes == 0 {
        1.0
    } else {
        (semantic_edges as f64 / content_nodes as f64).min(1.0)
    };
    let embedding_term = (embedded_nodes as f64 / total_nodes as f64).min(1.0);

    let score = 0.3 * weak_term + 0.4 * semantic_term + 0.3 * embedding_term;

    let status = if score >= 0.8 {
        HealthStatus::Healthy
    } else if score >= 0.5 {
        HealthStatus::NeedsAttention
    } else {
        HealthStatus::Critical
    };

    let code_node_coverage = if code_nodes == 0 { 0.0 } else { code_nodes as f64 / total_nodes as f64 };
    let diff_enrichment_pct = if commit_nodes.is_empty() {
        0.0
    } else {
        enriched_commits as f64 / commit_nodes.len() as f64
    };

    let mut recommendations = Vec::new();
    if weak_nodes as f64 / total_nodes as f64 > 0.3 {
        recommendations.push("run the archive job to clear out accumulated weak memories".to_string());
    }
    if (embedded_nodes as f64) < total_nodes as f64 * 0.5 {
        recommendations.push("build embeddings — fewer than half the nodes have vectors indexed".to_string());
    } else if vector_store.is_none() {
        recommendations.push("install an ANN backend for faster semantic search".to_string());
    }
    if semantic_term < 0.5 {
        recommendations.push("run a sleep cycle to add connections between isolated memories".to_string());
    }
    if !commit_nodes.is_empty() && diff_enrichment_pct < 0.5 {
        recommendations.push("enrich remaining commits with diff analysis".to_string());
    }

    Ok(HealthReport {
        score,
        status,
        total_nodes,
        content_nodes,
        weak_nodes,
        semantic_edges,
        embedded_nodes,
        code_nodes,
        code_node_coverage,
        diff_enrichment_pct,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{LabelSet, MemoryState, Node};
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn node(id: &str, labels: &[&str]) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(id));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));
        Node {
            id: id.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect::<LabelSet>(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.01),
        }
    }

    #[test]
    fn empty_graph_is_healthy_by_default() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let report = compute_health(&graph, None).unwrap();
        assert_eq!(report.status, HealthStatus::Healthy);
    }

    #[test]
    fn graph_full_of_weak_memories_is_flagged() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        for i in 0..10 {
            graph.add_node_raw(node(&format!("n{i}"), &["Episode", "WeakMemory"])).unwrap();
        }
        let report = compute_health(&graph, None).unwrap();
        assert!(report.status != HealthStatus::Healthy);
        assert!(report.recommendations.iter().any(|r| r.contains("archive")));
    }

    #[test]
    fn weak_ratio_below_threshold_does_not_recommend_archive() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        for i in 0..3 {
            graph.add_node_raw(node(&format!("w{i}"), &["Episode", "WeakMemory"])).unwrap();
        }
        for i in 0..9 {
            graph.add_node_raw(node(&format!("s{i}"), &["Episode"])).unwrap();
        }
        let report = compute_health(&graph, None).unwrap();
        assert!(!report.recommendations.iter().any(|r| r.contains("archive")));
    }

    /// A fixed-count stand-in for a real backend, just to drive the
    /// embedding-coverage recommendation without a working vector index.
    struct FixedCountStore(usize);

    impl VectorStore for FixedCountStore {
        fn upsert(&mut self, _node_id: &str, _vector: &[f32]) -> EngramResult<()> {
            Ok(())
        }
        fn delete(&mut self, _node_id: &str) -> EngramResult<()> {
            Ok(())
        }
        fn count(&self) -> usize {
            self.0
        }
        fn get(&self, _ids: &[String]) -> Vec<(String, Vec<f32>)> {
            Vec::new()
        }
        fn query(&self, _query: &[f32], _k: usize) -> EngramResult<Vec<engram_embeddings::vector::VectorMatch>> {
            Ok(Vec::new())
        }
        fn flush(&self) -> EngramResult<()> {
            Ok(())
        }
    }

    #[test]
    fn partial_embedding_coverage_still_recommends_building_the_rest() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        for i in 0..10 {
            graph.add_node_raw(node(&format!("n{i}"), &["Episode"])).unwrap();
        }

        let store = FixedCountStore(4);
        let report = compute_health(&graph, Some(&store as &dyn VectorStore)).unwrap();
        assert!(report.recommendations.iter().any(|r| r.contains("build embeddings")));
    }

    #[test]
    fn majority_embedding_coverage_does_not_recommend_building() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        for i in 0..10 {
            graph.add_node_raw(node(&format!("n{i}"), &["Episode"])).unwrap();
        }

        let store = FixedCountStore(6);
        let report = compute_health(&graph, Some(&store as &dyn VectorStore)).unwrap();
        assert!(!report.recommendations.iter().any(|r| r.contains("build embeddings")));
    }

    #[test]
    fn well_connected_graph_scores_higher_than_isolated_one() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(node("a", &["Pattern"])).unwrap();
        graph.add_node_raw(node("b", &["Pattern"])).unwrap();
        let isolated = compute_health(&graph, None).unwrap();

        graph
            .add_edge(engram_core::Edge::new("a", "b", engram_core::EdgeType::RelatedTo, 0.8))
            .unwrap();
        let connected = compute_health(&graph, None).unwrap();

        assert!(connected.score >= isolated.score);
    }
}
