//! Developer presence state layered on top of `Person` nodes (spec §6
//! `get_dev_state`/`update_dev_state`, reserved properties `focus`,
//! `last_session`, `expertise`, `sessions_count`). Nothing else in the
//! engine reads or writes these properties, so they live entirely in the
//! facade rather than in `engram-graph`.

use std::collections::HashMap;

use serde_json::{json, Value};

use engram_core::errors::EngramResult;
use engram_core::EdgeType;
use engram_graph::{ensure_person_node, Graph};

/// A snapshot of one developer's standing state, read off their `Person`
/// node.
#[derive(Debug, Clone, PartialEq)]
pub struct DevState {
    pub email: String,
    pub name: Option<String>,
    pub focus: Option<String>,
    pub last_session: Option<String>,
    pub expertise: Vec<String>,
    pub sessions_count: u64,
}

impl DevState {
    fn from_properties(email: &str, props: &serde_json::Map<String, Value>) -> Self {
        Self {
            email: email.to_string(),
            name: props.get("name").and_then(Value::as_str).map(str::to_string),
            focus: props.get("focus").and_then(Value::as_str).map(str::to_string),
            last_session: props.get("last_session").and_then(Value::as_str).map(str::to_string),
            expertise: props
                .get("expertise")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            sessions_count: props.get("sessions_count").and_then(Value::as_u64).unwrap_or(0),
        }
    }

    /// Looks up a `Person` node by email, trying the deterministic
    /// `person-<email>` id first and falling back to a scan of every
    /// `Person` node's `email` property (covers people minted via the
    /// `@alias` path, whose id isn't email-derived).
    pub(crate) fn load(graph: &Graph, email: &str) -> EngramResult<Option<Self>> {
        let direct_id = format!("person-{email}");
        if let Some(node) = graph.get_node(&direct_id)? {
            return Ok(Some(Self::from_properties(email, &node.properties)));
        }

        for person in graph.get_by_label("Person")? {
            if person.properties.get("email").and_then(Value::as_str) == Some(email) {
                return Ok(Some(Self::from_properties(email, &person.properties)));
            }
        }
        Ok(None)
    }

    /// Creates the `Person` node if needed, applies the given fields,
    /// bumps `sessions_count`, recomputes `expertise` from the labels of
    /// everything they've authored, and persists the result. Returns the
    /// node id.
    pub(crate) fn update(
        graph: &Graph,
        email: &str,
        focus: Option<&str>,
        last_session: Option<&str>,
        name: Option<&str>,
    ) -> EngramResult<String> {
        let person_id = ensure_person_node(graph.storage(), email)?;
        let mut node = graph
            .get_node(&person_id)?
            .expect("ensure_person_node just created or confirmed this node");

        if let Some(focus) = focus {
            node.properties.insert("focus".to_string(), json!(focus));
        }
        if let Some(last_session) = last_session {
            node.properties.insert("last_session".to_string(), json!(last_session));
        }
        if let Some(name) = name {
            node.properties.insert("name".to_string(), json!(name));
            node.properties.insert("title".to_string(), json!(name));
        }

        let sessions_count = node.properties.get("sessions_count").and_then(Value::as_u64).unwrap_or(0) + 1;
        node.properties.insert("sessions_count".to_string(), json!(sessions_count));

        let expertise = Self::compute_expertise(graph, &person_id)?;
        node.properties.insert("expertise".to_string(), json!(expertise));

        graph.storage().upsert_node(&node)?;
        Ok(person_id)
    }

    /// The labels of everything authored by this person, most frequent
    /// first, capped to the 5 most common — a cheap proxy for "what this
    /// person tends to work on" with no extra modeling.
    fn compute_expertise(graph: &Graph, person_id: &str) -> EngramResult<Vec<String>> {
        let authored = graph.get_predecessors(person_id, Some(EdgeType::AuthoredBy))?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for node in &authored {
            for label in &node.labels {
                if label == "Person" {
                    continue;
                }
                *counts.entry(label.clone()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(ranked.into_iter().take(5).map(|(label, _)| label).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_storage::StorageEngine;

    use super::*;

    fn fresh_graph() -> Graph {
        Graph::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
    }

    #[test]
    fn update_creates_a_person_and_sets_fields() {
        let graph = fresh_graph();
        let id = DevState::update(&graph, "jane@example.com", Some("auth refactor"), Some("2026-07-29"), Some("Jane")).unwrap();
        assert_eq!(id, "person-jane@example.com");

        let state = DevState::load(&graph, "jane@example.com").unwrap().unwrap();
        assert_eq!(state.focus.as_deref(), Some("auth refactor"));
        assert_eq!(state.last_session.as_deref(), Some("2026-07-29"));
        assert_eq!(state.name.as_deref(), Some("Jane"));
        assert_eq!(state.sessions_count, 1);
    }

    #[test]
    fn repeated_updates_increment_sessions_count() {
        let graph = fresh_graph();
        DevState::update(&graph, "jane@example.com", None, None, None).unwrap();
        DevState::update(&graph, "jane@example.com", None, None, None).unwrap();
        let state = DevState::load(&graph, "jane@example.com").unwrap().unwrap();
        assert_eq!(state.sessions_count, 2);
    }

    #[test]
    fn missing_person_returns_none() {
        let graph = fresh_graph();
        assert!(DevState::load(&graph, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn expertise_reflects_authored_labels() {
        let graph = fresh_graph();
        graph
            .add_memory(
                "ADR 1",
                "content",
                ["ADR".to_string()].into_iter().collect(),
                "jane@example.com",
                None,
                &[],
            )
            .unwrap();
        graph
            .add_memory(
                "ADR 2",
                "more content",
                ["ADR".to_string()].into_iter().collect(),
                "jane@example.com",
                None,
                &[],
            )
            .unwrap();

        DevState::update(&graph, "jane@example.com", None, None, None).unwrap();
        let state = DevState::load(&graph, "jane@example.com").unwrap().unwrap();
        assert_eq!(state.expertise, vec!["ADR".to_string()]);
    }
}
