//! Result shaping: compact vs full records, and the semantic `connections`
//! list attached to full records (spec §4.5 step 5 "Output").

use serde::Serialize;
use serde_json::{Map, Value};

use engram_core::{compact_type, EdgeType, LabelSet, MemoryState};
use engram_core::errors::EngramResult;
use engram_graph::Graph;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    pub id: String,
    #[serde(serialize_with = "serialize_edge_type")]
    pub edge_type: EdgeType,
    pub weight: f64,
    pub direction: Direction,
}

fn serialize_edge_type<S: serde::Serializer>(edge_type: &EdgeType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(edge_type.as_str())
}

#[derive(Debug, Clone, Serialize)]
pub struct CompactResult {
    pub id: String,
    pub score: f64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullResult {
    pub id: String,
    pub score: f64,
    pub labels: LabelSet,
    pub props: Map<String, Value>,
    pub memory: MemoryState,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RetrievalResult {
    Compact(CompactResult),
    Full(FullResult),
}

impl RetrievalResult {
    pub fn id(&self) -> &str {
        match self {
            RetrievalResult::Compact(r) => &r.id,
            RetrievalResult::Full(r) => &r.id,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            RetrievalResult::Compact(r) => r.score,
            RetrievalResult::Full(r) => r.score,
        }
    }
}

/// Up to 10 outgoing + 10 incoming edges of a semantic (activation) type,
/// the `connections[]` field of a full result (spec §4.5 step 5).
pub fn semantic_connections(graph: &Graph, node_id: &str) -> EngramResult<Vec<Connection>> {
    let mut connections = Vec::new();

    let outgoing = graph.storage().outgoing_edges(node_id)?;
    for edge in outgoing.into_iter().filter(|e| e.edge_type.is_activation_type()).take(10) {
        connections.push(Connection {
            id: edge.to_id,
            edge_type: edge.edge_type,
            weight: edge.weight,
            direction: Direction::Outgoing,
        });
    }

    let incoming = graph.storage().incoming_edges(node_id)?;
    for edge in incoming.into_iter().filter(|e| e.edge_type.is_activation_type()).take(10) {
        connections.push(Connection {
            id: edge.from_id,
            edge_type: edge.edge_type,
            weight: edge.weight,
            direction: Direction::Incoming,
        });
    }

    Ok(connections)
}

/// Builds the compact `{id, score, title, type, date}` record for `node`.
pub fn compact_result(node: &engram_core::Node, score: f64) -> CompactResult {
    CompactResult {
        id: node.id.clone(),
        score,
        title: node.title().unwrap_or(&node.id).to_string(),
        kind: compact_type(&node.labels),
        date: Some(node.memory.created_at.to_rfc3339()),
    }
}

/// Builds the full `{id, score, labels, props, memory, connections[]}`
/// record for `node`.
pub fn full_result(graph: &Graph, node: &engram_core::Node, score: f64) -> EngramResult<FullResult> {
    Ok(FullResult {
        id: node.id.clone(),
        score,
        labels: node.labels.clone(),
        props: node.properties.clone(),
        memory: node.memory.clone(),
        connections: semantic_connections(graph, &node.id)?,
    })
}
