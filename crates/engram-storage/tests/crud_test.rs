//! Node/edge CRUD and upsert-merge semantics (spec §8 invariants 2 and 3).

use std::collections::BTreeSet;

use serde_json::json;

use engram_core::{Edge, EdgeType, MemoryState, Node};
use engram_storage::StorageEngine;

fn make_node(id: &str, title: &str, label: &str) -> Node {
    let now = chrono::Utc::now();
    let mut properties = serde_json::Map::new();
    properties.insert("title".to_string(), json!(title));
    properties.insert("content".to_string(), json!(format!("content for {title}")));
    let mut labels = BTreeSet::new();
    labels.insert(label.to_string());
    Node {
        id: id.to_string(),
        labels,
        properties,
        memory: MemoryState::new(now, 0.02),
    }
}

#[test]
fn insert_then_get_round_trips_node() {
    let storage = StorageEngine::open_in_memory().expect("open");
    let node = make_node("abc12345", "Use SQLite for storage", "Decision");

    storage.upsert_node(&node).expect("insert");
    let fetched = storage.get_node("abc12345").expect("get").expect("present");

    assert_eq!(fetched.id, "abc12345");
    assert_eq!(fetched.title(), Some("Use SQLite for storage"));
    assert!(fetched.has_label("Decision"));
}

#[test]
fn upsert_replaces_content_and_unions_labels() {
    let storage = StorageEngine::open_in_memory().expect("open");
    let mut node = make_node("dup0001", "Original title", "Episode");
    storage.upsert_node(&node).expect("insert");

    node.set_property("content", json!("revised content"));
    node.labels.insert("Concept".to_string());
    storage.upsert_node(&node).expect("upsert");

    let fetched = storage.get_node("dup0001").expect("get").expect("present");
    assert_eq!(fetched.content(), Some("revised content"));
    assert!(fetched.has_label("Episode"));
    assert!(fetched.has_label("Concept"));
}

#[test]
fn deleting_node_cascades_its_edges() {
    let storage = StorageEngine::open_in_memory().expect("open");
    let a = make_node("nodea001", "Node A", "Episode");
    let b = make_node("nodeb001", "Node B", "Episode");
    storage.upsert_node(&a).expect("insert a");
    storage.upsert_node(&b).expect("insert b");

    let edge = Edge::new("nodea001", "nodeb001", EdgeType::RelatedTo, 0.6);
    storage.upsert_edge(&edge).expect("insert edge");

    assert_eq!(storage.outgoing_edges("nodea001").unwrap().len(), 1);

    storage.delete_node("nodea001").expect("delete");
    assert!(storage.outgoing_edges("nodea001").unwrap().is_empty());
    assert!(storage.get_node("nodea001").unwrap().is_none());
}

#[test]
fn re_adding_an_edge_keeps_the_higher_weight() {
    let storage = StorageEngine::open_in_memory().expect("open");
    let a = make_node("edgea001", "Edge A", "Episode");
    let b = make_node("edgeb001", "Edge B", "Episode");
    storage.upsert_node(&a).expect("insert a");
    storage.upsert_node(&b).expect("insert b");

    storage
        .upsert_edge(&Edge::new("edgea001", "edgeb001", EdgeType::RelatedTo, 0.3))
        .expect("first");
    storage
        .upsert_edge(&Edge::new("edgea001", "edgeb001", EdgeType::RelatedTo, 0.9))
        .expect("second, higher");
    storage
        .upsert_edge(&Edge::new("edgea001", "edgeb001", EdgeType::RelatedTo, 0.1))
        .expect("third, lower");

    let edges = storage.outgoing_edges("edgea001").expect("outgoing");
    assert_eq!(edges.len(), 1, "triple is unique, not duplicated");
    assert!((edges[0].weight - 0.9).abs() < f64::EPSILON);
}

#[test]
fn snapshot_export_then_import_round_trips() {
    let storage = StorageEngine::open_in_memory().expect("open");
    let a = make_node("snapa001", "Snapshot A", "Episode");
    let b = make_node("snapb001", "Snapshot B", "Concept");
    storage.upsert_node(&a).expect("insert a");
    storage.upsert_node(&b).expect("insert b");
    storage
        .upsert_edge(&Edge::new("snapa001", "snapb001", EdgeType::RelatedTo, 0.7))
        .expect("insert edge");

    let snapshot = storage.export_snapshot().expect("export");
    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(snapshot.edges.len(), 1);

    let fresh = StorageEngine::open_in_memory().expect("open fresh");
    fresh.import_snapshot(&snapshot).expect("import");

    assert_eq!(fresh.all_nodes().unwrap().len(), 2);
    assert_eq!(fresh.all_edges().unwrap().len(), 1);
    assert_eq!(
        fresh.get_node("snapa001").unwrap().unwrap().title(),
        Some("Snapshot A")
    );
}
