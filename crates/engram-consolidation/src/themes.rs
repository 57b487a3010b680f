//! Themes phase (spec §4.6 "Themes"): synthetic `Theme` nodes over commits
//! sharing a scope, and `PatternCluster` nodes over patterns sharing a
//! resolved domain.

use std::collections::HashMap;

use chrono::Utc;
use engram_core::config::ConsolidationConfig;
use engram_core::errors::EngramResult;
use engram_core::{decay_rate_for_labels, node_id, Edge, EdgeType, LabelSet, MemoryState, Node};
use engram_graph::Graph;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemesStats {
    pub themes_created: usize,
    pub theme_edges: usize,
    pub clusters_created: usize,
    pub cluster_edges: usize,
}

pub fn themes(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<ThemesStats> {
    let (themes_created, theme_edges) = build_commit_themes(graph, config)?;
    let (clusters_created, cluster_edges) = build_pattern_clusters(graph, config)?;
    Ok(ThemesStats {
        themes_created,
        theme_edges,
        clusters_created,
        cluster_edges,
    })
}

fn build_commit_themes(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<(usize, usize)> {
    let commits = graph.storage().nodes_by_label("Commit")?;

    let mut by_scope: HashMap<String, Vec<String>> = HashMap::new();
    for commit in &commits {
        if let Some(scope) = commit.properties.get("scope").and_then(|v| v.as_str()) {
            by_scope.entry(scope.to_string()).or_default().push(commit.id.clone());
        }
    }

    let mut themes_created = 0;
    let mut theme_edges = 0;

    let mut scopes: Vec<String> = by_scope.keys().cloned().collect();
    scopes.sort();

    for scope in scopes {
        let members = &by_scope[&scope];
        if members.len() < config.theme_min_commits {
            continue;
        }

        let title = format!("Theme: {scope}");
        let labels: LabelSet = ["Theme"].into_iter().map(String::from).collect();
        let theme_id = node_id(&title, &labels);

        if !graph.storage().node_exists(&theme_id)? {
            graph.add_node_raw(synthetic_node(&theme_id, &title, labels.clone(), &format!("Commits in scope '{scope}'")))?;
            themes_created += 1;
        }

        for member in members {
            graph.add_edge(Edge::new(
                member.clone(),
                theme_id.clone(),
                EdgeType::BelongsToTheme,
                EdgeType::BelongsToTheme.default_weight(),
            ))?;
            theme_edges += 1;
        }
    }

    Ok((themes_created, theme_edges))
}

fn build_pattern_clusters(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<(usize, usize)> {
    let patterns = graph.storage().nodes_by_label("Pattern")?;

    let mut by_domain: HashMap<String, Vec<String>> = HashMap::new();
    for pattern in &patterns {
        for edge in graph.storage().outgoing_edges(&pattern.id)? {
            if edge.edge_type != EdgeType::BelongsTo {
                continue;
            }
            let Some(target) = graph.get_node(&edge.to_id)? else { continue };
            if !target.has_label("Domain") {
                continue;
            }
            let domain_name = target.title().unwrap_or(&edge.to_id).to_string();
            by_domain.entry(domain_name).or_default().push(pattern.id.clone());
        }
    }

    let mut clusters_created = 0;
    let mut cluster_edges = 0;

    let mut domains: Vec<String> = by_domain.keys().cloned().collect();
    domains.sort();

    for domain in domains {
        let members = &by_domain[&domain];
        if members.len() < config.cluster_min_patterns {
            continue;
        }

        let title = format!("Cluster: {domain}");
        let labels: LabelSet = ["PatternCluster"].into_iter().map(String::from).collect();
        let cluster_id = node_id(&title, &labels);

        if !graph.storage().node_exists(&cluster_id)? {
            graph.add_node_raw(synthetic_node(
                &cluster_id,
                &title,
                labels.clone(),
                &format!("Patterns in domain '{domain}'"),
            ))?;
            clusters_created += 1;
        }

        for member in members {
            graph.add_edge(Edge::new(
                member.clone(),
                cluster_id.clone(),
                EdgeType::ClusteredIn,
                EdgeType::ClusteredIn.default_weight(),
            ))?;
            cluster_edges += 1;
        }
    }

    Ok((clusters_created, cluster_edges))
}

fn synthetic_node(id: &str, title: &str, labels: LabelSet, content: &str) -> Node {
    let now = Utc::now();
    let decay_rate = decay_rate_for_labels(&labels);
    let mut properties = Map::new();
    properties.insert("title".to_string(), Value::from(title));
    properties.insert("author".to_string(), Value::from(""));
    properties.insert("content".to_string(), Value::from(content));
    properties.insert("summary".to_string(), Value::from(content));
    Node {
        id: id.to_string(),
        labels,
        properties,
        memory: MemoryState::new(now, decay_rate),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn commit_node(id: &str, scope: &str) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(id));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));
        properties.insert("scope".to_string(), Value::from(scope));
        Node {
            id: id.to_string(),
            labels: ["Episode", "Commit"].into_iter().map(String::from).collect(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.01),
        }
    }

    #[test]
    fn e2_three_commits_same_scope_form_one_theme() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(commit_node("c1", "brain")).unwrap();
        graph.add_node_raw(commit_node("c2", "brain")).unwrap();
        graph.add_node_raw(commit_node("c3", "brain")).unwrap();

        let stats = themes(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.themes_created, 1);
        assert_eq!(stats.theme_edges, 3);

        let theme_id = node_id("Theme: brain", &["Theme".to_string()].into_iter().collect());
        let theme = graph.get_node(&theme_id).unwrap().unwrap();
        assert_eq!(theme.title(), Some("Theme: brain"));
        for commit_id in ["c1", "c2", "c3"] {
            assert!(graph.has_edge(commit_id, &theme_id, EdgeType::BelongsToTheme).unwrap());
        }
    }

    #[test]
    fn below_threshold_scope_produces_no_theme() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(commit_node("c1", "tiny")).unwrap();
        graph.add_node_raw(commit_node("c2", "tiny")).unwrap();

        let stats = themes(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.themes_created, 0);
        assert_eq!(stats.theme_edges, 0);
    }
}
