//! Edge CRUD: upsert with max-weight merge on the `(from_id, to_id, type)`
//! unique key (spec §8 invariant 3 — re-asserting a relationship never
//! weakens it).

use rusqlite::{params, Connection, Error as SqliteError, ErrorCode, OptionalExtension};
use serde_json::Map;

use engram_core::{Edge, EdgeType, ParseEdgeTypeError};

fn row_to_edge(
    from_id: String,
    to_id: String,
    type_str: String,
    weight: f64,
    properties_json: String,
    created_at: Option<String>,
) -> Result<Edge, String> {
    let edge_type: EdgeType = type_str.parse().map_err(|e: ParseEdgeTypeError| e.to_string())?;
    let properties: Map<String, serde_json::Value> =
        serde_json::from_str(&properties_json).map_err(|e| e.to_string())?;
    let created_at = created_at
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(chrono::Utc::now);

    Ok(Edge {
        from_id,
        to_id,
        edge_type,
        weight,
        properties,
        created_at,
    })
}

/// `true` if `err` is a `FOREIGN KEY constraint failed` violation — one
/// endpoint doesn't exist. Callers swallow this (spec §7 IntegrityViolation
/// is never surfaced to the caller, only logged).
fn is_fk_violation(err: &SqliteError) -> bool {
    matches!(
        err,
        SqliteError::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Insert an edge, or if `(from_id, to_id, type)` already exists, keep
/// whichever weight is larger and merge the new properties over the old.
///
/// Silently no-ops (after logging) if either endpoint doesn't exist, rather
/// than propagating the foreign-key violation — spec §7 requires integrity
/// violations during ingestion to never abort the caller.
pub fn upsert_edge(conn: &Connection, edge: &Edge) -> Result<(), String> {
    let existing: Option<f64> = conn
        .query_row(
            "SELECT weight FROM edges WHERE from_id = ?1 AND to_id = ?2 AND type = ?3",
            params![edge.from_id, edge.to_id, edge.edge_type.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| e.to_string())?;

    let properties_json = serde_json::to_string(&edge.properties).map_err(|e| e.to_string())?;

    let result = match existing {
        None => conn.execute(
            "INSERT INTO edges (from_id, to_id, type, weight, properties, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                edge.from_id,
                edge.to_id,
                edge.edge_type.as_str(),
                edge.weight,
                properties_json,
                edge.created_at.to_rfc3339(),
            ],
        ),
        Some(current_weight) => {
            let merged_weight = current_weight.max(edge.weight);
            conn.execute(
                "UPDATE edges SET weight = ?4, properties = ?5
                 WHERE from_id = ?1 AND to_id = ?2 AND type = ?3",
                params![
                    edge.from_id,
                    edge.to_id,
                    edge.edge_type.as_str(),
                    merged_weight,
                    properties_json,
                ],
            )
        }
    };

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_fk_violation(&e) => {
            tracing::debug!(
                from = %edge.from_id, to = %edge.to_id, edge_type = %edge.edge_type,
                "dropping edge: endpoint missing"
            );
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

pub fn delete_edge(
    conn: &Connection,
    from_id: &str,
    to_id: &str,
    edge_type: EdgeType,
) -> Result<bool, String> {
    let rows = conn
        .execute(
            "DELETE FROM edges WHERE from_id = ?1 AND to_id = ?2 AND type = ?3",
            params![from_id, to_id, edge_type.as_str()],
        )
        .map_err(|e| e.to_string())?;
    Ok(rows > 0)
}

pub fn outgoing_edges(conn: &Connection, node_id: &str) -> Result<Vec<Edge>, String> {
    let mut stmt = conn
        .prepare(
            "SELECT from_id, to_id, type, weight, properties, created_at
             FROM edges WHERE from_id = ?1",
        )
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map(params![node_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .map_err(|e| e.to_string())?;

    rows.map(|r| r.map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(f, t, ty, w, p, c)| row_to_edge(f, t, ty, w, p, c))
        .collect()
}

pub fn incoming_edges(conn: &Connection, node_id: &str) -> Result<Vec<Edge>, String> {
    let mut stmt = conn
        .prepare(
            "SELECT from_id, to_id, type, weight, properties, created_at
             FROM edges WHERE to_id = ?1",
        )
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map(params![node_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .map_err(|e| e.to_string())?;

    rows.map(|r| r.map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(f, t, ty, w, p, c)| row_to_edge(f, t, ty, w, p, c))
        .collect()
}

pub fn edges_by_type(conn: &Connection, edge_type: EdgeType) -> Result<Vec<Edge>, String> {
    let mut stmt = conn
        .prepare(
            "SELECT from_id, to_id, type, weight, properties, created_at
             FROM edges WHERE type = ?1",
        )
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map(params![edge_type.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .map_err(|e| e.to_string())?;

    rows.map(|r| r.map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(f, t, ty, w, p, c)| row_to_edge(f, t, ty, w, p, c))
        .collect()
}

pub fn all_edges(conn: &Connection) -> Result<Vec<Edge>, String> {
    let mut stmt = conn
        .prepare("SELECT from_id, to_id, type, weight, properties, created_at FROM edges")
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .map_err(|e| e.to_string())?;

    rows.map(|r| r.map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(f, t, ty, w, p, c)| row_to_edge(f, t, ty, w, p, c))
        .collect()
}
