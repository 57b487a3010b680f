use std::sync::Arc;

use chrono::{Duration, Utc};

use engram_core::config::DecayConfig;
use engram_core::{MemoryState, Node};
use engram_decay::DecayEngine;
use engram_graph::Graph;
use engram_storage::StorageEngine;

fn graph() -> Graph {
    Graph::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
}

#[test]
fn apply_decay_archives_weak_unprotected_nodes() {
    let g = graph();
    let now = Utc::now();

    let mut labels = std::collections::BTreeSet::new();
    labels.insert("Episode".to_string());
    let mut props = serde_json::Map::new();
    props.insert("title".to_string(), serde_json::json!("old episode"));

    let node = Node {
        id: "ep1".to_string(),
        labels,
        properties: props,
        memory: MemoryState {
            strength: 1.0,
            access_count: 1,
            last_accessed: Some(now - Duration::days(365)),
            created_at: now - Duration::days(365),
            decay_rate: 0.01,
        },
    };
    g.add_node_raw(node).unwrap();

    let engine = DecayEngine::new(DecayConfig::default());
    let stats = engine.apply_decay(&g, now).unwrap();

    assert_eq!(stats.nodes_processed, 1);
    assert_eq!(stats.newly_archived, 1);

    let updated = g.get_node("ep1").unwrap().unwrap();
    assert!(updated.has_label("Archived"));
}

#[test]
fn apply_decay_never_archives_person_nodes() {
    let g = graph();
    let now = Utc::now();

    let mut labels = std::collections::BTreeSet::new();
    labels.insert("Person".to_string());
    let node = Node {
        id: "person-x".to_string(),
        labels,
        properties: serde_json::Map::new(),
        memory: MemoryState {
            strength: 1.0,
            access_count: 1,
            last_accessed: Some(now - Duration::days(1000)),
            created_at: now,
            decay_rate: 5.0,
        },
    };
    g.add_node_raw(node).unwrap();

    let engine = DecayEngine::new(DecayConfig::default());
    engine.apply_decay(&g, now).unwrap();

    let updated = g.get_node("person-x").unwrap().unwrap();
    assert!(!updated.has_label("Archived"));
}

#[test]
fn nodes_never_accessed_are_left_untouched() {
    let g = graph();
    let now = Utc::now();

    let mut labels = std::collections::BTreeSet::new();
    labels.insert("Concept".to_string());
    let node = Node {
        id: "c1".to_string(),
        labels,
        properties: serde_json::Map::new(),
        memory: MemoryState {
            strength: 0.7,
            access_count: 0,
            last_accessed: None,
            created_at: now,
            decay_rate: 0.003,
        },
    };
    g.add_node_raw(node).unwrap();

    let engine = DecayEngine::new(DecayConfig::default());
    let stats = engine.apply_decay(&g, now).unwrap();
    assert_eq!(stats.nodes_decayed, 0);

    let unchanged = g.get_node("c1").unwrap().unwrap();
    assert_eq!(unchanged.memory.strength, 0.7);
}
