//! `Graph` — the node/edge CRUD surface wrapping `engram-storage`, with
//! author resolution, domain inference, and reference resolution folded
//! into `add_memory` the way the original encoding pipeline does (spec §4.2).

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use engram_core::errors::EngramResult;
use engram_core::{decay_rate_for_labels, derive_summary, node_id, Edge, EdgeType, LabelSet, MemoryState, Node};
use engram_storage::StorageEngine;

use crate::{author, domain, links};

/// Thin graph-API wrapper around a shared `StorageEngine`.
///
/// Cheap to clone: internally an `Arc`, so callers across the retrieval,
/// ingestion, and consolidation crates can each hold one without fighting
/// over a single owner.
#[derive(Clone)]
pub struct Graph {
    storage: Arc<StorageEngine>,
}

impl Graph {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Add (or update) a memory node: the full encoding pipeline — upsert,
    /// author edge, explicit + wikilink reference edges, domain inference.
    ///
    /// Ordering matches spec §5: node insert → label set → author edge →
    /// reference edges → domain edge. Callers that also need an embedding
    /// upserted between the label set and the author edge should use
    /// [`Graph::upsert_memory_node`] directly and drive the rest of the
    /// pipeline themselves (the facade crate does this).
    pub fn add_memory(
        &self,
        title: &str,
        content: &str,
        labels: LabelSet,
        author: &str,
        props: Option<Map<String, Value>>,
        references: &[String],
    ) -> EngramResult<String> {
        let id = self.upsert_memory_node(title, content, labels, props)?;
        self.link_authored_by(&id, author)?;
        self.link_references(&id, content, references)?;
        self.link_domain(&id, content)?;
        Ok(id)
    }

    /// Just the node-upsert half of `add_memory`: deterministic id, new node
    /// or merge-into-existing, no edges. Exposed so callers that need to
    /// interleave an embedding upsert between the label set and the edges
    /// (spec §5 ordering) can do so without duplicating the upsert logic.
    pub fn upsert_memory_node(
        &self,
        title: &str,
        content: &str,
        labels: LabelSet,
        props: Option<Map<String, Value>>,
    ) -> EngramResult<String> {
        let id = node_id(title, &labels);

        if let Some(existing) = self.storage.get_node(&id)? {
            return self.merge_memory_node(existing, title, content, labels, props);
        }

        let now = chrono::Utc::now();
        let decay_rate = decay_rate_for_labels(&labels);
        let summary = derive_summary(content);

        let mut properties = props.unwrap_or_default();
        properties.insert("title".to_string(), Value::from(title));
        properties.insert("content".to_string(), Value::from(content));
        properties.insert("summary".to_string(), Value::from(summary));

        let node = Node {
            id: id.clone(),
            labels,
            properties,
            memory: MemoryState::new(now, decay_rate),
        };
        self.storage.upsert_node(&node)?;
        Ok(id)
    }

    fn merge_memory_node(
        &self,
        mut existing: Node,
        title: &str,
        content: &str,
        labels: LabelSet,
        props: Option<Map<String, Value>>,
    ) -> EngramResult<String> {
        if let Some(extra) = props {
            for (k, v) in extra {
                existing.properties.insert(k, v);
            }
        }
        existing.properties.insert("title".to_string(), Value::from(title));
        existing.properties.insert("content".to_string(), Value::from(content));
        existing
            .properties
            .insert("summary".to_string(), Value::from(derive_summary(content)));
        existing.memory.reinforce(chrono::Utc::now());
        existing.labels.extend(labels);

        let id = existing.id.clone();
        self.storage.upsert_node(&existing)?;
        Ok(id)
    }

    /// Attach the `AUTHORED_BY` edge for an already-upserted node.
    pub fn link_authored_by(&self, node_id: &str, author: &str) -> EngramResult<()> {
        if author.is_empty() {
            return Ok(());
        }
        let person_id = author::ensure_person_node(&self.storage, author)?;
        self.storage.upsert_edge(&Edge::new(
            node_id,
            person_id,
            EdgeType::AuthoredBy,
            EdgeType::AuthoredBy.default_weight(),
        ))
    }

    /// Attach `REFERENCES` edges (explicit ids plus `[[wikilinks]]` found in
    /// `content`) for an already-upserted node.
    pub fn link_references(&self, node_id: &str, content: &str, explicit_refs: &[String]) -> EngramResult<()> {
        for reference in explicit_refs {
            let target = if self.storage.node_exists(reference)? {
                Some(reference.clone())
            } else {
                links::resolve_link(&self.storage, reference)?
            };
            if let Some(target) = target {
                self.storage.upsert_edge(&Edge::new(
                    node_id,
                    target,
                    EdgeType::References,
                    EdgeType::References.default_weight(),
                ))?;
            }
        }

        for link in links::extract_wikilinks(content) {
            if let Some(target) = links::resolve_link(&self.storage, &link)? {
                self.storage.upsert_edge(&Edge::new(
                    node_id,
                    target,
                    EdgeType::References,
                    EdgeType::References.default_weight(),
                ))?;
            }
        }

        Ok(())
    }

    /// Attach the inferred `BELONGS_TO` domain edge for an already-upserted
    /// node, if `content` matches any domain keyword bucket.
    pub fn link_domain(&self, node_id: &str, content: &str) -> EngramResult<()> {
        let Some(inferred) = domain::infer_domain(content) else {
            return Ok(());
        };
        let domain_id = self.ensure_domain_node(inferred)?;
        self.storage.upsert_edge(&Edge::new(
            node_id,
            domain_id,
            EdgeType::BelongsTo,
            EdgeType::BelongsTo.default_weight(),
        ))
    }

    fn ensure_domain_node(&self, domain: &str) -> EngramResult<String> {
        let domain_id = format!("domain-{}", domain.to_lowercase());
        if self.storage.node_exists(&domain_id)? {
            return Ok(domain_id);
        }

        let now = chrono::Utc::now();
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(domain));
        properties.insert("name".to_string(), Value::from(domain));
        properties.insert("author".to_string(), Value::from(""));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));

        let mut labels = BTreeSet::new();
        labels.insert("Domain".to_string());

        let node = Node {
            id: domain_id.clone(),
            labels,
            properties,
            memory: MemoryState::new(now, 0.0001),
        };
        self.storage.upsert_node(&node)?;
        Ok(domain_id)
    }

    /// Add a synthetic node (`Theme`, `PatternCluster`, ...) directly,
    /// bypassing author resolution and domain inference entirely — used by
    /// the sleep-phase consolidation passes.
    pub fn add_node_raw(&self, node: Node) -> EngramResult<()> {
        self.storage.upsert_node(&node)
    }

    pub fn add_edge(&self, edge: Edge) -> EngramResult<()> {
        self.storage.upsert_edge(&edge)
    }

    pub fn has_edge(&self, from_id: &str, to_id: &str, edge_type: EdgeType) -> EngramResult<bool> {
        Ok(self
            .storage
            .outgoing_edges(from_id)?
            .into_iter()
            .any(|e| e.to_id == to_id && e.edge_type == edge_type))
    }

    pub fn get_node(&self, id: &str) -> EngramResult<Option<Node>> {
        self.storage.get_node(id)
    }

    pub fn delete_node(&self, id: &str) -> EngramResult<bool> {
        self.storage.delete_node(id)
    }

    /// Outgoing + incoming neighbor node ids for spreading activation and
    /// graph traversal (spec §5.2).
    pub fn neighbors(&self, id: &str) -> EngramResult<Vec<(String, EdgeType, f64)>> {
        let mut out = Vec::new();
        for edge in self.storage.outgoing_edges(id)? {
            out.push((edge.to_id, edge.edge_type, edge.weight));
        }
        for edge in self.storage.incoming_edges(id)? {
            out.push((edge.from_id, edge.edge_type, edge.weight));
        }
        Ok(out)
    }

    pub fn predecessors(&self, id: &str) -> EngramResult<Vec<String>> {
        Ok(self.storage.incoming_edges(id)?.into_iter().map(|e| e.from_id).collect())
    }

    pub fn successors(&self, id: &str) -> EngramResult<Vec<String>> {
        Ok(self.storage.outgoing_edges(id)?.into_iter().map(|e| e.to_id).collect())
    }

    pub fn node_count(&self) -> EngramResult<usize> {
        Ok(self.storage.all_nodes()?.len())
    }

    pub fn edge_count(&self) -> EngramResult<usize> {
        Ok(self.storage.all_edges()?.len())
    }

    pub fn get_all_nodes(&self) -> EngramResult<Vec<Node>> {
        self.storage.all_nodes()
    }

    pub fn get_by_label(&self, label: &str) -> EngramResult<Vec<Node>> {
        self.storage.nodes_by_label(label)
    }

    pub fn get_edges_by_type(&self, edge_type: EdgeType) -> EngramResult<Vec<Edge>> {
        self.storage.edges_by_type(edge_type)
    }

    pub fn get_edge(&self, from_id: &str, to_id: &str, edge_type: EdgeType) -> EngramResult<Option<Edge>> {
        Ok(self
            .storage
            .outgoing_edges(from_id)?
            .into_iter()
            .find(|e| e.to_id == to_id && e.edge_type == edge_type))
    }

    /// Outgoing neighbor nodes, optionally filtered to a single edge type
    /// (spec §6 `get_neighbors(id, type?)`).
    pub fn get_neighbors(&self, id: &str, edge_type: Option<EdgeType>) -> EngramResult<Vec<Node>> {
        let mut out = Vec::new();
        for edge in self.storage.outgoing_edges(id)? {
            if edge_type.is_some_and(|t| t != edge.edge_type) {
                continue;
            }
            if let Some(node) = self.storage.get_node(&edge.to_id)? {
                out.push(node);
            }
        }
        Ok(out)
    }

    /// Incoming neighbor nodes, optionally filtered to a single edge type
    /// (spec §6 `get_predecessors(id, type?)`).
    pub fn get_predecessors(&self, id: &str, edge_type: Option<EdgeType>) -> EngramResult<Vec<Node>> {
        let mut out = Vec::new();
        for edge in self.storage.incoming_edges(id)? {
            if edge_type.is_some_and(|t| t != edge.edge_type) {
                continue;
            }
            if let Some(node) = self.storage.get_node(&edge.from_id)? {
                out.push(node);
            }
        }
        Ok(out)
    }

    /// In-degree + out-degree of a node, used by dedup's "edge-richer
    /// survivor" rule (spec §4.6).
    pub fn degree(&self, id: &str) -> EngramResult<usize> {
        Ok(self.storage.outgoing_edges(id)?.len() + self.storage.incoming_edges(id)?.len())
    }

    /// Deletes a node and (via `ON DELETE CASCADE`) every edge touching it
    /// (spec §3 invariant "deleting a node deletes its edges").
    pub fn remove_node(&self, id: &str) -> EngramResult<bool> {
        self.storage.delete_node(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
    }

    fn labels(names: &[&str]) -> LabelSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_memory_creates_author_and_domain_edges() {
        let g = graph();
        let id = g
            .add_memory(
                "Switch auth to JWT",
                "We migrated login to JWT tokens with session expiry.",
                labels(&["Decision"]),
                "jane@example.com",
                None,
                &[],
            )
            .unwrap();

        let node = g.get_node(&id).unwrap().unwrap();
        assert!(node.has_label("Decision"));

        let neighbors = g.neighbors(&id).unwrap();
        assert!(neighbors.iter().any(|(_, ty, _)| *ty == EdgeType::AuthoredBy));
        assert!(neighbors.iter().any(|(_, ty, _)| *ty == EdgeType::BelongsTo));
    }

    #[test]
    fn re_adding_the_same_title_and_labels_upserts_not_duplicates() {
        let g = graph();
        let id1 = g
            .add_memory("Retry pattern", "initial content", labels(&["Pattern"]), "", None, &[])
            .unwrap();
        let id2 = g
            .add_memory("Retry pattern", "revised content", labels(&["Pattern"]), "", None, &[])
            .unwrap();

        assert_eq!(id1, id2);
        assert_eq!(g.node_count().unwrap(), 1);
        assert_eq!(g.get_node(&id1).unwrap().unwrap().content(), Some("revised content"));
    }

    #[test]
    fn wikilinks_in_content_become_reference_edges() {
        let g = graph();
        let target_id = g
            .add_memory("Use SQLite", "Chose SQLite for storage.", labels(&["Decision"]), "", None, &[])
            .unwrap();

        let source_id = g
            .add_memory(
                "Schema design",
                "Builds on [[Use SQLite]] for the property graph.",
                labels(&["Concept"]),
                "",
                None,
                &[],
            )
            .unwrap();

        assert!(g.has_edge(&source_id, &target_id, EdgeType::References).unwrap());
    }
}
