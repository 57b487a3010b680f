//! Whole-graph export/import for `graph.json` snapshots (spec §8 invariant 9:
//! export then import must reproduce every node and edge).

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use engram_core::{Edge, Node};

use super::{edge_ops, node_ops};

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn export_snapshot(conn: &Connection) -> Result<GraphSnapshot, String> {
    Ok(GraphSnapshot {
        version: crate::migrations::LATEST_VERSION,
        nodes: node_ops::get_all_nodes(conn)?,
        edges: edge_ops::all_edges(conn)?,
    })
}

/// Import a snapshot into an already-migrated, empty-or-not database.
/// Nodes and edges are upserted, so importing into a populated graph merges
/// rather than duplicates.
pub fn import_snapshot(conn: &Connection, snapshot: &GraphSnapshot) -> Result<(), String> {
    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(|e| e.to_string())?;

    for node in &snapshot.nodes {
        let result = if node_ops::node_exists(conn, &node.id)? {
            node_ops::replace_node(conn, node)
        } else {
            node_ops::insert_node(conn, node)
        };
        if let Err(e) = result {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }

    for edge in &snapshot.edges {
        if let Err(e) = edge_ops::upsert_edge(conn, edge) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }

    conn.execute_batch("COMMIT").map_err(|e| e.to_string())
}
