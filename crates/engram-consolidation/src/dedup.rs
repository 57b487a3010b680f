//! Duplicate merging (spec §4.6 "Dedup"): nodes sharing a case-insensitive
//! `title` or a non-empty reserved identifier prop (`adr_id`/`pat_id`/
//! `exp_id`/`commit_hash`) are folded into the member with the most edges.

use std::collections::{HashMap, HashSet};

use engram_core::errors::EngramResult;
use engram_core::Edge;
use engram_graph::Graph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub duplicate_groups: usize,
    pub nodes_removed: usize,
    pub edges_transferred: usize,
}

const RESERVED_ID_KEYS: &[&str] = &["adr_id", "pat_id", "exp_id", "commit_hash"];

/// Runs the dedup pass over the whole graph.
pub fn dedup(graph: &Graph) -> EngramResult<DedupStats> {
    let mut stats = DedupStats::default();
    let nodes = graph.storage().all_nodes()?;

    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for node in &nodes {
        if let Some(title) = node.title() {
            groups
                .entry(format!("title:{}", title.to_lowercase()))
                .or_default()
                .push(node.id.clone());
        }
        for key in RESERVED_ID_KEYS {
            if let Some(value) = node.properties.get(*key).and_then(|v| v.as_str()) {
                if !value.is_empty() {
                    groups.entry(format!("{key}:{value}")).or_default().push(node.id.clone());
                }
            }
        }
    }

    let mut removed: HashSet<String> = HashSet::new();
    let mut group_ids: Vec<String> = groups.keys().cloned().collect();
    group_ids.sort();

    for key in group_ids {
        let candidates: HashSet<String> = groups[&key]
            .iter()
            .filter(|id| !removed.contains(*id))
            .cloned()
            .collect();
        if candidates.len() < 2 {
            continue;
        }
        let mut ids: Vec<String> = candidates.into_iter().collect();
        ids.sort();

        stats.duplicate_groups += 1;
        merge_group(graph, &ids, &mut removed, &mut stats)?;
    }

    stats.nodes_removed = removed.len();
    Ok(stats)
}

/// Picks the survivor (highest `in_degree + out_degree`, ties broken by id
/// for determinism), transfers every loser's edges to it, unions labels, and
/// deletes the losers.
fn merge_group(graph: &Graph, ids: &[String], removed: &mut HashSet<String>, stats: &mut DedupStats) -> EngramResult<()> {
    let mut scored: Vec<(String, usize)> = Vec::with_capacity(ids.len());
    for id in ids {
        let degree = graph.storage().outgoing_edges(id)?.len() + graph.storage().incoming_edges(id)?.len();
        scored.push((id.clone(), degree));
    }
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let survivor_id = scored[0].0.clone();
    let Some(mut survivor) = graph.get_node(&survivor_id)? else {
        return Ok(());
    };

    for (loser_id, _) in &scored[1..] {
        let Some(loser) = graph.get_node(loser_id)? else { continue };

        for edge in graph.storage().outgoing_edges(loser_id)? {
            if edge.to_id == survivor_id {
                continue;
            }
            if !graph.has_edge(&survivor_id, &edge.to_id, edge.edge_type)? {
                graph.add_edge(Edge::new(survivor_id.clone(), edge.to_id, edge.edge_type, edge.weight))?;
                stats.edges_transferred += 1;
            }
        }
        for edge in graph.storage().incoming_edges(loser_id)? {
            if edge.from_id == survivor_id {
                continue;
            }
            if !graph.has_edge(&edge.from_id, &survivor_id, edge.edge_type)? {
                graph.add_edge(Edge::new(edge.from_id, survivor_id.clone(), edge.edge_type, edge.weight))?;
                stats.edges_transferred += 1;
            }
        }

        survivor.labels.extend(loser.labels);
        graph.delete_node(loser_id)?;
        removed.insert(loser_id.clone());
    }

    graph.add_node_raw(survivor)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{EdgeType, LabelSet, MemoryState, Node};
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn titled_node(id: &str, title: &str) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(title));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));
        Node {
            id: id.to_string(),
            labels: LabelSet::new(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.01),
        }
    }

    #[test]
    fn edge_richer_duplicate_survives() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);

        graph.add_node_raw(titled_node("rich", "ADR-001: X")).unwrap();
        graph.add_node_raw(titled_node("bare", "ADR-001: X")).unwrap();
        graph.add_node_raw(titled_node("other", "Unrelated")).unwrap();
        graph
            .add_edge(Edge::new("rich", "other", EdgeType::References, 0.6))
            .unwrap();

        let stats = dedup(&graph).unwrap();
        assert_eq!(stats.duplicate_groups, 1);
        assert_eq!(stats.nodes_removed, 1);
        assert!(graph.get_node("rich").unwrap().is_some());
        assert!(graph.get_node("bare").unwrap().is_none());
    }

    #[test]
    fn duplicate_identifier_prop_also_merges() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);

        let mut a = titled_node("a", "Pattern A");
        a.properties.insert("pat_id".to_string(), Value::from("PAT-001"));
        let mut b = titled_node("b", "Pattern A (dup)");
        b.properties.insert("pat_id".to_string(), Value::from("PAT-001"));
        graph.add_node_raw(a).unwrap();
        graph.add_node_raw(b).unwrap();

        let stats = dedup(&graph).unwrap();
        assert_eq!(stats.duplicate_groups, 1);
        assert_eq!(stats.nodes_removed, 1);
        assert_eq!(graph.node_count().unwrap(), 1);
    }

    #[test]
    fn unique_titles_are_left_alone() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(titled_node("a", "First")).unwrap();
        graph.add_node_raw(titled_node("b", "Second")).unwrap();

        let stats = dedup(&graph).unwrap();
        assert_eq!(stats.duplicate_groups, 0);
        assert_eq!(stats.nodes_removed, 0);
        assert_eq!(graph.node_count().unwrap(), 2);
    }
}
