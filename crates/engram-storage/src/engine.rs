//! `StorageEngine` — single-writer/multi-reader SQLite connection wrapper.
//!
//! Owns the one `rusqlite::Connection`, applies WAL + foreign-key pragmas,
//! runs migrations on open, and exposes the CRUD/search/snapshot query
//! modules as inherent methods. No code outside this module should reach
//! for a raw `&Connection` against the engram database.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_core::{Edge, EdgeType, LabelSet, Node};

use crate::migrations;
use crate::queries::{edge_ops, meta_ops, node_ops, search_ops, snapshot_ops};
use crate::to_storage_err;

pub struct StorageEngine {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl StorageEngine {
    /// Open (or create) a file-backed store and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> EngramResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| to_storage_err(format!("create {}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory store. Used by tests and by callers that want a
    /// scratch graph with no persistence.
    pub fn open_in_memory() -> EngramResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> EngramResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| to_storage_err(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| to_storage_err(e.to_string()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| to_storage_err(e.to_string()))?;

        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Force a WAL checkpoint, folding the write-ahead log back into the
    /// main database file.
    pub fn checkpoint(&self) -> EngramResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")
            .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(())
    }

    /// Raw access for callers not yet covered by a dedicated method.
    pub fn with_conn<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> Result<T, String>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn).map_err(to_storage_err)
    }

    // ── nodes ──

    pub fn upsert_node(&self, node: &Node) -> EngramResult<()> {
        self.with_conn(|conn| {
            if node_ops::node_exists(conn, &node.id)? {
                node_ops::replace_node(conn, node)
            } else {
                node_ops::insert_node(conn, node)
            }
        })
    }

    pub fn get_node(&self, id: &str) -> EngramResult<Option<Node>> {
        self.with_conn(|conn| node_ops::get_node(conn, id))
    }

    pub fn delete_node(&self, id: &str) -> EngramResult<bool> {
        self.with_conn(|conn| node_ops::delete_node(conn, id))
    }

    pub fn node_exists(&self, id: &str) -> EngramResult<bool> {
        self.with_conn(|conn| node_ops::node_exists(conn, id))
    }

    pub fn get_labels(&self, node_id: &str) -> EngramResult<LabelSet> {
        self.with_conn(|conn| node_ops::get_labels(conn, node_id))
    }

    pub fn all_nodes(&self) -> EngramResult<Vec<Node>> {
        self.with_conn(node_ops::get_all_nodes)
    }

    pub fn nodes_by_label(&self, label: &str) -> EngramResult<Vec<Node>> {
        self.with_conn(|conn| node_ops::get_by_label(conn, label))
    }

    pub fn nodes_since(&self, since_rfc3339: &str) -> EngramResult<Vec<Node>> {
        self.with_conn(|conn| node_ops::nodes_since(conn, since_rfc3339))
    }

    pub fn node_ids_by_author_fragment(&self, fragment: &str) -> EngramResult<Vec<String>> {
        self.with_conn(|conn| node_ops::node_by_author_contains(conn, fragment))
    }

    /// Of `ids`, which have `created_at >= since` — single batch query.
    pub fn filter_ids_since(&self, ids: &[String], since_rfc3339: &str) -> EngramResult<Vec<String>> {
        self.with_conn(|conn| node_ops::filter_ids_since(conn, ids, since_rfc3339))
    }

    /// Of `ids`, which carry at least one of `labels` — single batch query.
    pub fn filter_ids_with_any_label(&self, ids: &[String], labels: &[String]) -> EngramResult<Vec<String>> {
        self.with_conn(|conn| node_ops::filter_ids_with_any_label(conn, ids, labels))
    }

    /// Of `ids`, which have an author containing `fragment` — single batch query.
    pub fn filter_ids_by_author_contains(&self, ids: &[String], fragment: &str) -> EngramResult<Vec<String>> {
        self.with_conn(|conn| node_ops::filter_ids_by_author_contains(conn, ids, fragment))
    }

    // ── edges ──

    pub fn upsert_edge(&self, edge: &Edge) -> EngramResult<()> {
        self.with_conn(|conn| edge_ops::upsert_edge(conn, edge))
    }

    pub fn delete_edge(&self, from_id: &str, to_id: &str, edge_type: EdgeType) -> EngramResult<bool> {
        self.with_conn(|conn| edge_ops::delete_edge(conn, from_id, to_id, edge_type))
    }

    pub fn outgoing_edges(&self, node_id: &str) -> EngramResult<Vec<Edge>> {
        self.with_conn(|conn| edge_ops::outgoing_edges(conn, node_id))
    }

    pub fn incoming_edges(&self, node_id: &str) -> EngramResult<Vec<Edge>> {
        self.with_conn(|conn| edge_ops::incoming_edges(conn, node_id))
    }

    pub fn edges_by_type(&self, edge_type: EdgeType) -> EngramResult<Vec<Edge>> {
        self.with_conn(|conn| edge_ops::edges_by_type(conn, edge_type))
    }

    pub fn all_edges(&self) -> EngramResult<Vec<Edge>> {
        self.with_conn(edge_ops::all_edges)
    }

    // ── search ──

    pub fn fts_search(
        &self,
        query: &str,
        limit: usize,
        bm25_weights: (f64, f64, f64),
    ) -> EngramResult<Vec<search_ops::TextHit>> {
        self.with_conn(|conn| search_ops::fts_search(conn, query, limit, bm25_weights))
    }

    pub fn node_strength(&self, node_id: &str) -> EngramResult<Option<f64>> {
        self.with_conn(|conn| search_ops::node_strength(conn, node_id))
    }

    pub fn find_node_by_prop(&self, prop_name: &str, prop_value: &str) -> EngramResult<Option<String>> {
        self.with_conn(|conn| search_ops::find_node_by_prop(conn, prop_name, prop_value))
    }

    pub fn find_node_by_title_exact(&self, title: &str) -> EngramResult<Option<String>> {
        self.with_conn(|conn| search_ops::find_node_by_title_exact(conn, title))
    }

    pub fn find_node_by_title_prefix(&self, prefix: &str) -> EngramResult<Option<String>> {
        self.with_conn(|conn| search_ops::find_node_by_title_prefix(conn, prefix))
    }

    // ── meta ──

    /// Read an arbitrary `meta` key (schema version, embedding model
    /// identity, ...).
    pub fn get_meta(&self, key: &str) -> EngramResult<Option<String>> {
        self.with_conn(|conn| meta_ops::get_meta(conn, key))
    }

    pub fn set_meta(&self, key: &str, value: &str) -> EngramResult<()> {
        self.with_conn(|conn| meta_ops::set_meta(conn, key, value))
    }

    // ── snapshots ──

    pub fn export_snapshot(&self) -> EngramResult<snapshot_ops::GraphSnapshot> {
        self.with_conn(snapshot_ops::export_snapshot)
    }

    pub fn import_snapshot(&self, snapshot: &snapshot_ops::GraphSnapshot) -> EngramResult<()> {
        self.with_conn(|conn| snapshot_ops::import_snapshot(conn, snapshot))
    }
}
