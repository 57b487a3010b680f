//! Connect phase (spec §4.6 "Connect"): two sub-passes over the graph —
//! explicit content references, then co-scope/co-file commit pairing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use engram_core::config::ConsolidationConfig;
use engram_core::errors::EngramResult;
use engram_core::{Edge, EdgeType, LabelSet, Node};
use engram_graph::{extract_wikilinks, resolve_link, Graph};
use engram_ingest::extract_typed_references;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectStats {
    pub reference_edges: usize,
    pub same_scope_edges: usize,
    pub modifies_same_edges: usize,
}

pub fn connect(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<ConnectStats> {
    let reference_edges = connect_explicit_references(graph)?;
    let (same_scope_edges, modifies_same_edges) = connect_co_scope_co_file(graph, config)?;
    Ok(ConnectStats {
        reference_edges,
        same_scope_edges,
        modifies_same_edges,
    })
}

/// Sub-pass (a): scan every node's content for `ADR/PAT/EXP-NNN` tokens and
/// `[[wikilinks]]`, resolve each, and lay a typed edge per resolution.
fn connect_explicit_references(graph: &Graph) -> EngramResult<usize> {
    let nodes = graph.storage().all_nodes()?;
    let mut created = 0usize;

    for node in &nodes {
        let Some(content) = node.content() else { continue };

        let mut tokens = extract_typed_references(content);
        tokens.extend(extract_wikilinks(content));

        for token in tokens {
            let target_id = if graph.storage().node_exists(&token)? {
                Some(token.clone())
            } else {
                resolve_link(graph.storage(), &token)?
            };
            let Some(target_id) = target_id else { continue };
            if target_id == node.id {
                continue;
            }
            let Some(target) = graph.get_node(&target_id)? else { continue };

            let edge_type = typed_edge_for(&node.labels, &target.labels);
            graph.add_edge(Edge::new(node.id.clone(), target_id, edge_type, edge_type.default_weight()))?;
            created += 1;
        }
    }

    Ok(created)
}

/// `Pattern → ADR ⇒ INFORMED_BY`, `Commit → Pattern ⇒ APPLIES`, else
/// `REFERENCES` (spec §4.6 "Connect" (a)).
fn typed_edge_for(source_labels: &LabelSet, target_labels: &LabelSet) -> EdgeType {
    if source_labels.contains("Pattern") && target_labels.contains("ADR") {
        EdgeType::InformedBy
    } else if source_labels.contains("Commit") && target_labels.contains("Pattern") {
        EdgeType::Applies
    } else {
        EdgeType::References
    }
}

/// Sub-pass (b): pair up recent commits sharing a scope (`SAME_SCOPE`) or a
/// touched file (`MODIFIES_SAME`), capped per group to avoid O(n^2) blowup.
fn connect_co_scope_co_file(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<(usize, usize)> {
    let commits = graph.storage().nodes_by_label("Commit")?;

    let mut by_scope: HashMap<String, Vec<&Node>> = HashMap::new();
    let mut by_file: HashMap<String, Vec<&Node>> = HashMap::new();

    for commit in &commits {
        if let Some(scope) = commit.properties.get("scope").and_then(|v| v.as_str()) {
            by_scope.entry(scope.to_string()).or_default().push(commit);
        }
        if let Some(files) = commit.properties.get("files").and_then(|v| v.as_array()) {
            for file in files {
                if let Some(path) = file.as_str() {
                    by_file.entry(path.to_string()).or_default().push(commit);
                }
            }
        }
    }

    let mut same_scope_edges = 0;
    for (_, mut group) in by_scope {
        sort_newest_first(&mut group);
        group.truncate(config.co_scope_recent_commits);
        same_scope_edges += connect_pairs(graph, &group, EdgeType::SameScope)?;
    }

    let mut modifies_same_edges = 0;
    for (_, mut group) in by_file {
        sort_newest_first(&mut group);
        group.truncate(config.co_file_recent_commits);
        modifies_same_edges += connect_pairs(graph, &group, EdgeType::ModifiesSame)?;
    }

    Ok((same_scope_edges, modifies_same_edges))
}

fn sort_newest_first(group: &mut [&Node]) {
    group.sort_by(|a, b| newest_key(b).cmp(&newest_key(a)));
}

fn newest_key(node: &Node) -> DateTime<Utc> {
    node.memory.created_at
}

fn connect_pairs(graph: &Graph, group: &[&Node], edge_type: EdgeType) -> EngramResult<usize> {
    let mut created = 0;
    for i in 0..group.len() {
        for j in (i + 1)..group.len() {
            graph.add_edge(Edge::new(
                group[i].id.clone(),
                group[j].id.clone(),
                edge_type,
                edge_type.default_weight(),
            ))?;
            created += 1;
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::MemoryState;
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn commit_node(id: &str, scope: &str, files: &[&str]) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(id));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));
        properties.insert("scope".to_string(), Value::from(scope));
        properties.insert(
            "files".to_string(),
            Value::from(files.iter().map(|f| f.to_string()).collect::<Vec<_>>()),
        );
        Node {
            id: id.to_string(),
            labels: ["Episode", "Commit"].into_iter().map(String::from).collect(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.01),
        }
    }

    fn adr_node(id: &str, title: &str, content: &str) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(title));
        properties.insert("content".to_string(), Value::from(content));
        properties.insert("summary".to_string(), Value::from(content));
        properties.insert("adr_id".to_string(), Value::from(title.split(':').next().unwrap().trim()));
        Node {
            id: id.to_string(),
            labels: ["ADR", "Decision"].into_iter().map(String::from).collect(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.001),
        }
    }

    #[test]
    fn e1_modifies_same_without_same_scope() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(commit_node("c1", "x", &["a.py", "b.py"])).unwrap();
        graph.add_node_raw(commit_node("c2", "y", &["a.py"])).unwrap();

        let stats = connect(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.modifies_same_edges, 1);
        assert_eq!(stats.same_scope_edges, 0);
        assert!(graph.has_edge("c1", "c2", EdgeType::ModifiesSame).unwrap());
    }

    #[test]
    fn e6_wikilink_reference_is_idempotent() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph
            .add_node_raw(adr_node("adr1", "ADR-001: X", "We decided X."))
            .unwrap();
        graph
            .add_node_raw(adr_node("adr2", "ADR-002: Y", "Builds on [[ADR-001]]."))
            .unwrap();

        let config = ConsolidationConfig::default();
        connect(&graph, &config).unwrap();
        assert!(graph.has_edge("adr2", "adr1", EdgeType::References).unwrap());

        connect(&graph, &config).unwrap();
        let outgoing = graph.storage().outgoing_edges("adr2").unwrap();
        assert_eq!(outgoing.iter().filter(|e| e.to_id == "adr1").count(), 1);
    }
}
