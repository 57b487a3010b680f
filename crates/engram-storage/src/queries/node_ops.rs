//! Node CRUD: upsert, get, delete, label projection, bulk listing.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use engram_core::{LabelSet, MemoryState, Node};

const RESERVED_MEMORY_KEYS: &[&str] = &[
    "strength",
    "access_count",
    "last_accessed",
    "created_at",
    "decay_rate",
];

/// Merge a node's `memory` fields into its `properties` bag the way the
/// generated columns expect to find them (spec §4.1 schema).
fn to_properties_json(node: &Node) -> serde_json::Result<String> {
    let mut props = node.properties.clone();
    props.insert("strength".to_string(), Value::from(node.memory.strength));
    props.insert(
        "access_count".to_string(),
        Value::from(node.memory.access_count),
    );
    if let Some(last_accessed) = node.memory.last_accessed {
        props.insert(
            "last_accessed".to_string(),
            Value::from(last_accessed.to_rfc3339()),
        );
    }
    props.insert(
        "created_at".to_string(),
        Value::from(node.memory.created_at.to_rfc3339()),
    );
    props.insert("decay_rate".to_string(), Value::from(node.memory.decay_rate));
    serde_json::to_string(&props)
}

/// Split a stored properties JSON back into (extra properties, memory state).
fn from_properties_json(raw: &str) -> Result<(Map<String, Value>, MemoryState), String> {
    let mut props: Map<String, Value> =
        serde_json::from_str(raw).map_err(|e| format!("parse node properties: {e}"))?;

    let strength = props
        .get("strength")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    let access_count = props
        .get("access_count")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let created_at = props
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(chrono::Utc::now);
    let last_accessed = props
        .get("last_accessed")
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc));
    let decay_rate = props
        .get("decay_rate")
        .and_then(Value::as_f64)
        .unwrap_or(0.02);

    for key in RESERVED_MEMORY_KEYS {
        props.remove(*key);
    }

    Ok((
        props,
        MemoryState {
            strength,
            access_count,
            last_accessed,
            created_at,
            decay_rate,
        },
    ))
}

pub fn node_exists(conn: &Connection, id: &str) -> Result<bool, String> {
    conn.query_row("SELECT 1 FROM nodes WHERE id = ?1", params![id], |_| Ok(()))
        .optional()
        .map(|r| r.is_some())
        .map_err(|e| e.to_string())
}

/// Insert a brand-new node (caller has already checked it doesn't exist).
pub fn insert_node(conn: &Connection, node: &Node) -> Result<(), String> {
    let properties_json = to_properties_json(node).map_err(|e| e.to_string())?;
    conn.execute(
        "INSERT INTO nodes (id, properties) VALUES (?1, ?2)",
        params![node.id, properties_json],
    )
    .map_err(|e| e.to_string())?;
    set_labels(conn, &node.id, &node.labels)?;
    Ok(())
}

/// Replace an existing node's properties wholesale (used by `add_node_raw`
/// and by callers that have already computed the merged state, e.g. the
/// graph layer's upsert path).
pub fn replace_node(conn: &Connection, node: &Node) -> Result<(), String> {
    let properties_json = to_properties_json(node).map_err(|e| e.to_string())?;
    conn.execute(
        "UPDATE nodes SET properties = ?2 WHERE id = ?1",
        params![node.id, properties_json],
    )
    .map_err(|e| e.to_string())?;
    set_labels(conn, &node.id, &node.labels)?;
    Ok(())
}

pub fn get_node(conn: &Connection, id: &str) -> Result<Option<Node>, String> {
    let raw: Option<String> = conn
        .query_row("SELECT properties FROM nodes WHERE id = ?1", params![id], |row| row.get(0))
        .optional()
        .map_err(|e| e.to_string())?;

    let Some(raw) = raw else { return Ok(None) };
    let (properties, memory) = from_properties_json(&raw)?;
    let labels = get_labels(conn, id)?;

    Ok(Some(Node {
        id: id.to_string(),
        labels,
        properties,
        memory,
    }))
}

pub fn delete_node(conn: &Connection, id: &str) -> Result<bool, String> {
    let rows = conn
        .execute("DELETE FROM nodes WHERE id = ?1", params![id])
        .map_err(|e| e.to_string())?;
    Ok(rows > 0)
}

pub fn get_labels(conn: &Connection, node_id: &str) -> Result<LabelSet, String> {
    let mut stmt = conn
        .prepare("SELECT label FROM node_labels WHERE node_id = ?1")
        .map_err(|e| e.to_string())?;
    let labels = stmt
        .query_map(params![node_id], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<LabelSet, _>>()
        .map_err(|e| e.to_string())?;
    Ok(labels)
}

pub fn set_labels(conn: &Connection, node_id: &str, labels: &LabelSet) -> Result<(), String> {
    conn.execute(
        "DELETE FROM node_labels WHERE node_id = ?1",
        params![node_id],
    )
    .map_err(|e| e.to_string())?;
    for label in labels {
        conn.execute(
            "INSERT OR IGNORE INTO node_labels (node_id, label) VALUES (?1, ?2)",
            params![node_id, label],
        )
        .map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn get_all_nodes(conn: &Connection) -> Result<Vec<Node>, String> {
    let mut stmt = conn
        .prepare("SELECT id FROM nodes")
        .map_err(|e| e.to_string())?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    ids.into_iter()
        .filter_map(|id| get_node(conn, &id).transpose())
        .collect()
}

pub fn get_by_label(conn: &Connection, label: &str) -> Result<Vec<Node>, String> {
    let mut stmt = conn
        .prepare("SELECT node_id FROM node_labels WHERE label = ?1")
        .map_err(|e| e.to_string())?;
    let ids = stmt
        .query_map(params![label], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    ids.into_iter()
        .filter_map(|id| get_node(conn, &id).transpose())
        .collect()
}

pub fn nodes_since(conn: &Connection, since_rfc3339: &str) -> Result<Vec<Node>, String> {
    let mut stmt = conn
        .prepare("SELECT id FROM nodes WHERE created_at >= ?1")
        .map_err(|e| e.to_string())?;
    let ids = stmt
        .query_map(params![since_rfc3339], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    ids.into_iter()
        .filter_map(|id| get_node(conn, &id).transpose())
        .collect()
}

pub fn node_by_author_contains(conn: &Connection, fragment: &str) -> Result<Vec<String>, String> {
    let pattern = format!("%{}%", fragment.to_lowercase());
    let mut stmt = conn
        .prepare("SELECT id FROM nodes WHERE LOWER(author) LIKE ?1")
        .map_err(|e| e.to_string())?;
    stmt.query_map(params![pattern], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())
}

fn placeholders(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(",")
}

/// Of `ids`, which have `created_at >= since` — one batch query, no N+1
/// (spec §4.5 "Filters applied in batch").
pub fn filter_ids_since(conn: &Connection, ids: &[String], since_rfc3339: &str) -> Result<Vec<String>, String> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id FROM nodes WHERE id IN ({}) AND created_at >= ?",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;
    let mut params: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|i| i as &dyn rusqlite::ToSql).collect();
    params.push(&since_rfc3339);
    stmt.query_map(params.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())
}

/// Of `ids`, which have at least one of `labels` — one batch query.
pub fn filter_ids_with_any_label(conn: &Connection, ids: &[String], labels: &[String]) -> Result<Vec<String>, String> {
    if ids.is_empty() || labels.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT DISTINCT node_id FROM node_labels WHERE node_id IN ({}) AND label IN ({})",
        placeholders(ids.len()),
        placeholders(labels.len())
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;
    let all: Vec<&dyn rusqlite::ToSql> = ids
        .iter()
        .chain(labels.iter())
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    stmt.query_map(all.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())
}

/// Of `ids`, which have an author containing `fragment` (case-insensitive)
/// — one batch query.
pub fn filter_ids_by_author_contains(conn: &Connection, ids: &[String], fragment: &str) -> Result<Vec<String>, String> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id FROM nodes WHERE id IN ({}) AND LOWER(author) LIKE ?",
        placeholders(ids.len())
    );
    let pattern = format!("%{}%", fragment.to_lowercase());
    let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;
    let mut params: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|i| i as &dyn rusqlite::ToSql).collect();
    params.push(&pattern);
    stmt.query_map(params.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())
}
