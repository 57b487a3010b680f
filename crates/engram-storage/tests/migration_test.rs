//! Schema bootstrap and full-text search degrade path.

use serde_json::json;

use engram_core::{MemoryState, Node};
use engram_storage::StorageEngine;

#[test]
fn opening_a_fresh_store_lands_on_latest_schema_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("graph.db");

    let storage = StorageEngine::open(&db_path).expect("open");
    storage
        .with_conn(|conn| {
            conn.query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| e.to_string())
        })
        .map(|version| assert_eq!(version, "2"))
        .expect("schema_version recorded");
}

#[test]
fn reopening_an_existing_store_does_not_rerun_migrations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("graph.db");

    {
        let storage = StorageEngine::open(&db_path).expect("open once");
        let mut properties = serde_json::Map::new();
        properties.insert("title".to_string(), json!("Persisted node"));
        let node = Node {
            id: "persist01".to_string(),
            labels: Default::default(),
            properties,
            memory: MemoryState::new(chrono::Utc::now(), 0.02),
        };
        storage.upsert_node(&node).expect("insert");
    }

    let storage = StorageEngine::open(&db_path).expect("reopen");
    let node = storage.get_node("persist01").expect("get").expect("present");
    assert_eq!(node.title(), Some("Persisted node"));
}

#[test]
fn fts_search_finds_a_node_by_content_word() {
    let storage = StorageEngine::open_in_memory().expect("open");
    let mut properties = serde_json::Map::new();
    properties.insert("title".to_string(), json!("Spreading activation"));
    properties.insert(
        "content".to_string(),
        json!("Retrieval spreads activation outward from seed nodes through the graph."),
    );
    let node = Node {
        id: "ftsnode1".to_string(),
        labels: Default::default(),
        properties,
        memory: MemoryState::new(chrono::Utc::now(), 0.02),
    };
    storage.upsert_node(&node).expect("insert");

    let hits = storage
        .fts_search("activation", 10, (10.0, 1.0, 5.0))
        .expect("search");
    assert!(hits.iter().any(|h| h.node_id == "ftsnode1"));
}
