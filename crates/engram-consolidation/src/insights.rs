//! Insights / gaps phase (spec §4.6 "Insights / Gaps (optional)"): surfaces
//! clusters the graph hasn't named yet, and spots where it's thin.

use std::collections::{HashMap, HashSet};

use engram_core::errors::EngramResult;
use engram_core::EdgeType;
use engram_graph::Graph;
use petgraph::unionfind::UnionFind;

/// A weakly-connected group of `RELATED_TO`-linked nodes with no `Theme`
/// covering any of them — candidates for a theme nobody has named yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightCluster {
    pub node_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapReport {
    pub domains_without_patterns: Vec<String>,
    pub isolated_nodes: Vec<String>,
}

pub fn insights(graph: &Graph) -> EngramResult<Vec<InsightCluster>> {
    let nodes = graph.storage().all_nodes()?;

    let themed: HashSet<String> = graph
        .storage()
        .edges_by_type(EdgeType::BelongsToTheme)?
        .into_iter()
        .map(|e| e.from_id)
        .collect();

    let candidates: Vec<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| !themed.contains(*id))
        .collect();

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, id) in candidates.iter().enumerate() {
        index.insert(id, i);
    }

    let mut uf = UnionFind::new(candidates.len());
    for edge in graph.storage().edges_by_type(EdgeType::RelatedTo)? {
        if let (Some(&a), Some(&b)) = (index.get(edge.from_id.as_str()), index.get(edge.to_id.as_str())) {
            uf.union(a, b);
        }
    }

    let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
    for (id, &i) in &index {
        groups.entry(uf.find(i)).or_default().push((*id).to_string());
    }

    let mut clusters: Vec<InsightCluster> = groups
        .into_values()
        .filter(|members| members.len() >= 2)
        .map(|mut members| {
            members.sort();
            InsightCluster { node_ids: members }
        })
        .collect();
    clusters.sort_by(|a, b| a.node_ids.cmp(&b.node_ids));

    Ok(clusters)
}

pub fn gaps(graph: &Graph) -> EngramResult<GapReport> {
    let domains = graph.storage().nodes_by_label("Domain")?;
    let patterns = graph.storage().nodes_by_label("Pattern")?;

    let mut domains_with_patterns: HashSet<String> = HashSet::new();
    for pattern in &patterns {
        for edge in graph.storage().outgoing_edges(&pattern.id)? {
            if edge.edge_type == EdgeType::BelongsTo {
                domains_with_patterns.insert(edge.to_id);
            }
        }
    }

    let mut domains_without_patterns: Vec<String> = domains
        .iter()
        .filter(|d| !domains_with_patterns.contains(&d.id))
        .map(|d| d.id.clone())
        .collect();
    domains_without_patterns.sort();

    let mut isolated_nodes = Vec::new();
    for node in graph.storage().all_nodes()? {
        let outgoing = graph.storage().outgoing_edges(&node.id)?;
        let incoming = graph.storage().incoming_edges(&node.id)?;
        if outgoing.is_empty() && incoming.is_empty() {
            continue;
        }
        let has_semantic = outgoing.iter().chain(incoming.iter()).any(|e| e.edge_type.is_semantic());
        if !has_semantic {
            isolated_nodes.push(node.id);
        }
    }
    isolated_nodes.sort();

    Ok(GapReport {
        domains_without_patterns,
        isolated_nodes,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{Edge, LabelSet, MemoryState, Node};
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
    fn related_cluster_without_theme_is_surfaced() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(node("a", &["Pattern"])).unwrap();
        graph.add_node_raw(node("b", &["Pattern"])).unwrap();
        graph.add_node_raw(node("c", &["Pattern"])).unwrap();
        graph.add_edge(Edge::new("a", "b", EdgeType::RelatedTo, 0.8)).unwrap();

        let clusters = insights(&graph).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].node_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn themed_nodes_are_excluded_from_insights() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(node("a", &["Pattern"])).unwrap();
        graph.add_node_raw(node("b", &["Pattern"])).unwrap();
        graph.add_node_raw(node("theme1", &["Theme"])).unwrap();
        graph.add_edge(Edge::new("a", "b", EdgeType::RelatedTo, 0.8)).unwrap();
        graph
            .add_edge(Edge::new("a", "theme1", EdgeType::BelongsToTheme, 0.6))
            .unwrap();
        graph
            .add_edge(Edge::new("b", "theme1", EdgeType::BelongsToTheme, 0.6))
            .unwrap();

        let clusters = insights(&graph).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn domain_without_pattern_is_a_gap() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(node("auth_domain", &["Domain"])).unwrap();
        graph.add_node_raw(node("pat1", &["Pattern"])).unwrap();
        graph.add_node_raw(node("covered_domain", &["Domain"])).unwrap();
        graph
            .add_edge(Edge::new("pat1", "covered_domain", EdgeType::BelongsTo, 0.5))
            .unwrap();

        let report = gaps(&graph).unwrap();
        assert_eq!(report.domains_without_patterns, vec!["auth_domain".to_string()]);
    }

    #[test]
    fn structural_only_node_is_isolated() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(node("c1", &["Episode", "Commit"])).unwrap();
        graph.add_node_raw(node("p1", &["Person"])).unwrap();
        graph.add_edge(Edge::new("c1", "p1", EdgeType::AuthoredBy, 0.5)).unwrap();

        let report = gaps(&graph).unwrap();
        assert!(report.isolated_nodes.contains(&"c1".to_string()));
        assert!(report.isolated_nodes.contains(&"p1".to_string()));
    }
}
