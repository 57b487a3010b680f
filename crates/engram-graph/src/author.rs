//! Author resolution into `Person` nodes (spec §4.2 "author resolution").
//!
//! Three author shapes are accepted: a bare email (`jane@example.com`), a
//! legacy `@alias`, or a plain display name. Each maps to a stable
//! `person-<slug>` node id; `@alias` additionally consults existing
//! `Person.aliases` before minting a new node, so re-mentioning the same
//! alias under a different apparent id still lands on the same person.

use std::collections::BTreeSet;

use serde_json::{json, Map};

use engram_core::errors::EngramResult;
use engram_core::{compact_type, MemoryState, Node};
use engram_storage::StorageEngine;

fn find_person_by_alias(storage: &StorageEngine, alias: &str) -> EngramResult<Option<String>> {
    let people = storage.nodes_by_label("Person")?;
    for person in people {
        let matches = person
            .properties
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|aliases| aliases.iter().any(|a| a.as_str() == Some(alias)))
            .unwrap_or(false);
        if matches {
            return Ok(Some(person.id));
        }
    }
    Ok(None)
}

/// Ensure a `Person` node exists for `author`, returning its id.
pub fn ensure_person_node(storage: &StorageEngine, author: &str) -> EngramResult<String> {
    let (person_id, display_name, email, aliases) = if author.contains('@') && !author.starts_with('@') {
        let person_id = format!("person-{author}");
        let display_name = author.split('@').next().unwrap_or(author).to_string();
        (person_id, display_name, author.to_string(), Vec::new())
    } else if let Some(alias) = author.strip_prefix('@') {
        if let Some(existing) = find_person_by_alias(storage, author)? {
            return Ok(existing);
        }
        (
            format!("person-{alias}"),
            alias.to_string(),
            String::new(),
            vec![author.to_string()],
        )
    } else {
        (format!("person-{author}"), author.to_string(), String::new(), Vec::new())
    };

    if storage.node_exists(&person_id)? {
        return Ok(person_id);
    }

    let now = chrono::Utc::now();
    let mut properties: Map<String, serde_json::Value> = Map::new();
    properties.insert("title".to_string(), json!(display_name));
    properties.insert("author".to_string(), json!(""));
    properties.insert("content".to_string(), json!(""));
    properties.insert("summary".to_string(), json!(""));
    properties.insert("email".to_string(), json!(email));
    properties.insert("name".to_string(), json!(display_name));
    properties.insert("aliases".to_string(), json!(aliases));

    let mut labels = BTreeSet::new();
    labels.insert("Person".to_string());

    let node = Node {
        id: person_id.clone(),
        labels,
        properties,
        memory: MemoryState::new(now, 0.0001),
    };
    debug_assert_eq!(compact_type(&node.labels), "Person");

    storage.upsert_node(&node)?;
    Ok(person_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_maps_to_person_slug() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let id = ensure_person_node(&storage, "Jane Doe").unwrap();
        assert_eq!(id, "person-Jane Doe");
        assert!(storage.node_exists(&id).unwrap());
    }

    #[test]
    fn email_author_derives_display_name_before_at() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let id = ensure_person_node(&storage, "jane@example.com").unwrap();
        assert_eq!(id, "person-jane@example.com");
        let node = storage.get_node(&id).unwrap().unwrap();
        assert_eq!(node.title(), Some("jane"));
    }

    #[test]
    fn repeated_alias_resolves_to_the_same_person() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let first = ensure_person_node(&storage, "@jdoe").unwrap();
        let second = ensure_person_node(&storage, "@jdoe").unwrap();
        assert_eq!(first, second);
    }
}
