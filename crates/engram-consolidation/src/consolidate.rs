//! Lightweight periodic consolidation (spec §4.6, final paragraph): not a
//! full sleep cycle, just a cheap pass that strengthens and links recently
//! co-accessed memories so spreading activation can find new paths.
//!
//! Recency is judged from `last_accessed`/`access_count` — the node model
//! doesn't carry a sliding access log, so "touched >= 2 times in 7 days" is
//! approximated as "accessed at least twice, ever, with `last_accessed`
//! inside the window" (see DESIGN.md).

use chrono::{Duration, Utc};
use engram_core::config::ConsolidationConfig;
use engram_core::errors::EngramResult;
use engram_core::{Edge, EdgeType, Node};
use engram_graph::Graph;

use crate::util::{edge_exists_either_direction, stable_sample_key};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidateStats {
    pub edges_strengthened: usize,
    pub edges_created: usize,
}

pub fn consolidate(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<ConsolidateStats> {
    let edges_strengthened = strengthen_co_accessed_edges(graph, config)?;
    let edges_created = link_recently_co_touched(graph, config)?;
    Ok(ConsolidateStats {
        edges_strengthened,
        edges_created,
    })
}

fn recently_touched(node: &Node, window: Duration) -> bool {
    match node.memory.last_accessed {
        Some(last) => Utc::now() - last <= window,
        None => false,
    }
}

fn strengthen_co_accessed_edges(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<usize> {
    let window = Duration::days(config.consolidate_co_access_window_days);
    let nodes = graph.storage().all_nodes()?;
    let touched: std::collections::HashSet<&str> = nodes
        .iter()
        .filter(|n| recently_touched(n, window))
        .map(|n| n.id.as_str())
        .collect();

    let mut strengthened = 0;
    for edge_type in engram_core::EdgeType::ALL {
        if edge_type.is_structural() {
            continue;
        }
        for edge in graph.storage().edges_by_type(edge_type)? {
            if touched.contains(edge.from_id.as_str()) && touched.contains(edge.to_id.as_str()) {
                let new_weight = (edge.weight * config.consolidate_strengthen_factor).min(1.0);
                graph.add_edge(Edge::new(edge.from_id, edge.to_id, edge_type, new_weight))?;
                strengthened += 1;
            }
        }
    }
    Ok(strengthened)
}

fn link_recently_co_touched(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<usize> {
    let window = Duration::days(config.consolidate_co_access_window_days);
    let nodes = graph.storage().all_nodes()?;

    let mut candidates: Vec<&Node> = nodes
        .iter()
        .filter(|n| !n.has_label("Person") && !n.has_label("Domain"))
        .filter(|n| n.memory.access_count >= 2 && recently_touched(n, window))
        .collect();
    candidates.sort_by_key(|n| stable_sample_key(&n.id));

    let mut created = 0;
    'outer: for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if created >= config.consolidate_co_access_cap {
                break 'outer;
            }
            let a = &candidates[i].id;
            let b = &candidates[j].id;
            if edge_exists_either_direction(graph, a, b)? {
                continue;
            }
            graph.add_edge(Edge::new(a.clone(), b.clone(), EdgeType::CoAccessed, EdgeType::CoAccessed.default_weight()))?;
            created += 1;
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{LabelSet, MemoryState};
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn touched_node(id: &str, access_count: u64, hours_ago: i64) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(id));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));
        let mut memory = MemoryState::new(Utc::now() - Duration::hours(hours_ago), 0.01);
        memory.access_count = access_count;
        memory.last_accessed = Some(Utc::now() - Duration::hours(hours_ago));
        Node {
            id: id.to_string(),
            labels: LabelSet::new(),
            properties,
            memory,
        }
    }

    #[test]
    fn co_touched_pair_gets_co_accessed_edge() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(touched_node("a", 3, 2)).unwrap();
        graph.add_node_raw(touched_node("b", 3, 2)).unwrap();

        let stats = consolidate(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.edges_created, 1);
        assert!(graph.has_edge("a", "b", EdgeType::CoAccessed).unwrap() || graph.has_edge("b", "a", EdgeType::CoAccessed).unwrap());
    }

    #[test]
    fn stale_pair_is_not_linked() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(touched_node("a", 3, 24 * 30)).unwrap();
        graph.add_node_raw(touched_node("b", 3, 24 * 30)).unwrap();

        let stats = consolidate(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.edges_created, 0);
    }

    #[test]
    fn co_touched_edge_is_strengthened() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(touched_node("a", 3, 2)).unwrap();
        graph.add_node_raw(touched_node("b", 3, 2)).unwrap();
        graph.add_edge(Edge::new("a", "b", EdgeType::References, 0.5)).unwrap();

        let stats = consolidate(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.edges_strengthened, 1);
        let edges = graph.storage().edges_by_type(EdgeType::References).unwrap();
        assert!((edges[0].weight - 0.55).abs() < 1e-9);
    }
}
