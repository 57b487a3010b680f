//! Relate phase (spec §4.6 "Relate (semantic similarity)"): pairwise
//! `RELATED_TO` edges between similar non-person/domain nodes, by embedding
//! cosine similarity when available, falling back to sparse TF vectors.

use std::collections::{HashMap, HashSet};

use engram_core::config::ConsolidationConfig;
use engram_core::errors::EngramResult;
use engram_core::{Edge, EdgeType, Node};
use engram_embeddings::{cosine_similarity, VectorStore};
use engram_graph::Graph;

use crate::util::{edge_exists_either_direction, stable_sample_key};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelateStats {
    pub edges_created: usize,
    pub candidates_considered: usize,
    pub used_embeddings: bool,
}

/// `vector_store` is consulted first; if it has vectors for fewer than two
/// candidates (no embeddings built yet, or a fresh `TfIdfFallback`-only
/// setup), this falls back to the sparse TF-like vectors spec §4.6 names.
pub fn relate(graph: &Graph, vector_store: Option<&dyn VectorStore>, config: &ConsolidationConfig) -> EngramResult<RelateStats> {
    let nodes = graph.storage().all_nodes()?;
    let candidates: Vec<Node> = nodes
        .into_iter()
        .filter(|n| !n.has_label("Person") && !n.has_label("Domain"))
        .collect();

    if candidates.len() < 2 {
        return Ok(RelateStats {
            edges_created: 0,
            candidates_considered: candidates.len(),
            used_embeddings: false,
        });
    }

    if let Some(store) = vector_store {
        let ids: Vec<String> = candidates.iter().map(|n| n.id.clone()).collect();
        let pairs = store.get(&ids);
        if pairs.len() >= 2 {
            let vectors: HashMap<String, Vec<f32>> = pairs.into_iter().collect();
            let subset: Vec<&Node> = candidates.iter().filter(|n| vectors.contains_key(&n.id)).collect();
            let edges_created = relate_pairs(graph, &subset, config.relate_threshold, |a, b| {
                cosine_similarity(&vectors[a], &vectors[b])
            })?;
            return Ok(RelateStats {
                edges_created,
                candidates_considered: subset.len(),
                used_embeddings: true,
            });
        }
    }

    let sampled = sample_candidates(&candidates, config.relate_tfidf_candidate_cap);
    let vectors = build_tf_vectors(&sampled);
    let edges_created = relate_pairs(graph, &sampled, config.relate_threshold, |a, b| sparse_cosine(&vectors[a], &vectors[b]))?;
    Ok(RelateStats {
        edges_created,
        candidates_considered: sampled.len(),
        used_embeddings: false,
    })
}

fn relate_pairs<F>(graph: &Graph, candidates: &[&Node], threshold: f64, sim_fn: F) -> EngramResult<usize>
where
    F: Fn(&str, &str) -> f64,
{
    let mut created = 0;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let a = &candidates[i].id;
            let b = &candidates[j].id;
            let similarity = sim_fn(a, b);
            if similarity < threshold {
                continue;
            }
            if edge_exists_either_direction(graph, a, b)? {
                continue;
            }
            graph.add_edge(Edge::new(a.clone(), b.clone(), EdgeType::RelatedTo, similarity))?;
            created += 1;
        }
    }
    Ok(created)
}

/// Deterministic stand-in for "random sample to cap at 500" (spec §4.6):
/// orders candidates by a stable hash of their id and takes the prefix, so
/// the same graph always samples the same subset without a `rand`
/// dependency (see DESIGN.md).
fn sample_candidates(candidates: &[Node], cap: usize) -> Vec<&Node> {
    if candidates.len() <= cap {
        return candidates.iter().collect();
    }
    let mut ranked: Vec<&Node> = candidates.iter().collect();
    ranked.sort_by_key(|n| stable_sample_key(&n.id));
    ranked.truncate(cap);
    ranked
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sparse term-frequency vectors over the candidate set, keeping only terms
/// with document frequency in `[2, 0.8 * N]` (spec §4.6 "df in [2, 0.8*N]").
fn build_tf_vectors<'a>(nodes: &[&'a Node]) -> HashMap<&'a str, HashMap<String, f64>> {
    let n = nodes.len();
    let mut doc_tokens: HashMap<&str, Vec<String>> = HashMap::new();
    let mut doc_freq: HashMap<String, usize> = HashMap::new();

    for node in nodes {
        let text = node.content().or_else(|| node.summary()).unwrap_or_default();
        let tokens = tokenize(text);
        let unique: HashSet<&String> = tokens.iter().collect();
        for term in unique {
            *doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
        doc_tokens.insert(node.id.as_str(), tokens);
    }

    let max_df = ((n as f64) * 0.8).floor() as usize;
    let vocab: HashSet<&str> = doc_freq
        .iter()
        .filter(|(_, &count)| count >= 2 && count <= max_df)
        .map(|(term, _)| term.as_str())
        .collect();

    let mut vectors: HashMap<&str, HashMap<String, f64>> = HashMap::new();
    for node in nodes {
        let tokens = &doc_tokens[node.id.as_str()];
        let mut tf: HashMap<String, f64> = HashMap::new();
        for term in tokens {
            if vocab.contains(term.as_str()) {
                *tf.entry(term.clone()).or_insert(0.0) += 1.0;
            }
        }
        vectors.insert(node.id.as_str(), tf);
    }
    vectors
}

fn sparse_cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small.iter().filter_map(|(term, weight)| large.get(term).map(|other| weight * other)).sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{LabelSet, MemoryState};
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn content_node(id: &str, title: &str, content: &str, labels: &[&str]) -> Node {
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
    fn tfidf_fallback_links_overlapping_content_above_threshold() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let shared = "authentication token refresh retry backoff circuit breaker";
        graph
            .add_node_raw(content_node("n1", "Retry pattern", shared, &["Pattern"]))
            .unwrap();
        graph
            .add_node_raw(content_node("n2", "Retry pattern variant", shared, &["Pattern"]))
            .unwrap();
        graph
            .add_node_raw(content_node("n3", "Unrelated", "shipping address zip code form", &["Pattern"]))
            .unwrap();

        let stats = relate(&graph, None, &ConsolidationConfig::default()).unwrap();
        assert!(!stats.used_embeddings);
        assert!(graph.has_edge("n1", "n2", EdgeType::RelatedTo).unwrap());
        assert!(!graph.has_edge("n1", "n3", EdgeType::RelatedTo).unwrap());
        assert!(!graph.has_edge("n3", "n1", EdgeType::RelatedTo).unwrap());
    }

    #[test]
    fn person_and_domain_nodes_are_excluded() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(content_node("p1", "Jane", "jane bio text", &["Person"]))
            .unwrap();
        graph
            .add_node_raw(content_node("d1", "Auth", "auth domain text", &["Domain"]))
            .unwrap();

        let stats = relate(&graph, None, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.candidates_considered, 0);
        assert_eq!(stats.edges_created, 0);
    }

    #[test]
    fn no_duplicate_edge_when_one_already_exists() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let shared = "deployment pipeline docker kubernetes rollout canary";
        graph
            .add_node_raw(content_node("n1", "Deploy A", shared, &["Pattern"]))
            .unwrap();
        graph
            .add_node_raw(content_node("n2", "Deploy B", shared, &["Pattern"]))
            .unwrap();
        graph
            .add_edge(Edge::new("n1", "n2", EdgeType::References, 0.6))
            .unwrap();

        let stats = relate(&graph, None, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.edges_created, 0);
    }
}
