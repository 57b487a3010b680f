//! Integration test: a full default sleep cycle over a small seeded graph.

use std::sync::Arc;

use chrono::Utc;
use engram_consolidation::{ConsolidationEngine, PhaseStats};
use engram_core::{Edge, EdgeType, LabelSet, MemoryState, Node};
use engram_graph::Graph;
use engram_storage::StorageEngine;
use serde_json::{Map, Value};

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
    let mut memory = MemoryState::new(Utc::now(), 0.01);
    memory.access_count = 6;
    Node {
        id: id.to_string(),
        labels: ["Episode", "Commit"].into_iter().map(String::from).collect::<LabelSet>(),
        properties,
        memory,
    }
}

#[test]
fn default_sleep_cycle_connects_themes_and_calibrates_without_failures() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let graph = Graph::new(storage);

    for i in 0..5 {
        graph.add_node_raw(commit_node(&format!("c{i}"), "api", &[&format!("f{i}.rs")])).unwrap();
    }

    let engine = ConsolidationEngine::default();
    let report = engine.sleep_cycle(&graph, None, &[]);

    assert!(report.failures.is_empty(), "unexpected phase failures: {:?}", report.failures);
    assert_eq!(report.phases_run, vec!["connect", "relate", "themes", "calibrate", "decay"]);

    let themes_stats = report
        .stats
        .iter()
        .find_map(|s| match s {
            PhaseStats::Themes(stats) => Some(stats),
            _ => None,
        })
        .unwrap();
    assert_eq!(themes_stats.themes_created, 1);

    let theme_id = engram_core::node_id("Theme: api", &["Theme".to_string()].into_iter().collect());
    assert!(graph.get_node(&theme_id).unwrap().is_some());
}

#[test]
fn explicit_phase_list_runs_only_requested_phases_in_order() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let graph = Graph::new(storage);
    graph.add_node_raw(commit_node("c0", "auth", &["a.rs"])).unwrap();
    graph.add_node_raw(commit_node("c1", "auth", &["b.rs"])).unwrap();

    let engine = ConsolidationEngine::default();
    let report = engine.sleep_cycle(&graph, None, &["dedup".to_string(), "connect".to_string()]);

    assert_eq!(report.phases_run, vec!["dedup", "connect"]);
    assert!(report.failures.is_empty());
}

#[test]
fn dedup_then_connect_leaves_no_stray_duplicate_edges() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let graph = Graph::new(storage);

    let mut a = commit_node("a", "x", &[]);
    a.properties.insert("adr_id".to_string(), Value::from("ADR-010"));
    a.labels = ["ADR", "Decision"].into_iter().map(String::from).collect();
    let mut b = commit_node("b", "x", &[]);
    b.properties.insert("adr_id".to_string(), Value::from("ADR-010"));
    b.labels = ["ADR", "Decision"].into_iter().map(String::from).collect();
    graph.add_node_raw(a).unwrap();
    graph.add_node_raw(b).unwrap();
    graph.add_edge(Edge::new("a", "b", EdgeType::References, 0.6)).unwrap();

    let engine = ConsolidationEngine::default();
    let report = engine.sleep_cycle(&graph, None, &["dedup".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(graph.node_count().unwrap(), 1);
}
