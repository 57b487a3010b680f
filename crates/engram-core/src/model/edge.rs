use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::edge_type::EdgeType;

/// A directed, typed, weighted relation between two nodes (spec §3 "Edge").
///
/// `(from_id, to_id, type)` is unique; re-adding an existing triple keeps
/// the higher weight rather than creating a duplicate (spec §3 invariants,
/// §8 invariant 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from_id: String,
    pub to_id: String,
    pub edge_type: EdgeType,
    pub weight: f64,
    pub properties: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, edge_type: EdgeType, weight: f64) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            edge_type,
            weight: weight.clamp(0.0, 1.0),
            properties: Map::new(),
            created_at: Utc::now(),
        }
    }
}
