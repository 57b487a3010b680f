//! `graph.json` snapshot wire format (spec §6 "Wire-level persisted
//! state"): `{version, meta, nodes: {id: {...}}, edges: [...]}`, built from
//! an `engram_storage::GraphSnapshot`. Kept deliberately distinct from
//! `GraphSnapshot` itself — that type is storage's round-trip format
//! (`Vec<Node>`/`Vec<Edge>`), this one is the diffable, human-reviewable
//! shape version control actually sees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use engram_core::{EdgeType, LabelSet, MemoryState};
use engram_storage::queries::snapshot_ops::GraphSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphJsonMeta {
    pub saved_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphJsonNode {
    pub labels: LabelSet,
    pub props: Map<String, Value>,
    pub memory: MemoryState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphJsonEdge {
    pub src: String,
    pub tgt: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub weight: f64,
    pub props: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphJson {
    pub version: u32,
    pub meta: GraphJsonMeta,
    pub nodes: std::collections::BTreeMap<String, GraphJsonNode>,
    pub edges: Vec<GraphJsonEdge>,
}

impl GraphJson {
    pub(crate) fn from_snapshot(snapshot: &GraphSnapshot, backend: &str) -> Self {
        let nodes = snapshot
            .nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    GraphJsonNode {
                        labels: n.labels.clone(),
                        props: n.properties.clone(),
                        memory: n.memory.clone(),
                    },
                )
            })
            .collect();

        let edges = snapshot
            .edges
            .iter()
            .map(|e| GraphJsonEdge {
                src: e.from_id.clone(),
                tgt: e.to_id.clone(),
                edge_type: e.edge_type,
                weight: e.weight,
                props: e.properties.clone(),
                created_at: e.created_at,
            })
            .collect();

        Self {
            version: snapshot.version,
            meta: GraphJsonMeta {
                saved_at: Utc::now(),
                node_count: snapshot.nodes.len(),
                edge_count: snapshot.edges.len(),
                backend: backend.to_string(),
            },
            nodes,
            edges,
        }
    }
}
