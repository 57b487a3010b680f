//! Schema v1 — hybrid property graph with generated columns (spec §4.1).

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id            TEXT PRIMARY KEY,
    properties    TEXT NOT NULL DEFAULT '{}',
    title         TEXT GENERATED ALWAYS AS (json_extract(properties, '$.title')) STORED,
    author        TEXT GENERATED ALWAYS AS (json_extract(properties, '$.author')) STORED,
    content       TEXT GENERATED ALWAYS AS (json_extract(properties, '$.content')) STORED,
    summary       TEXT GENERATED ALWAYS AS (json_extract(properties, '$.summary')) STORED,
    strength      REAL GENERATED ALWAYS AS (COALESCE(json_extract(properties, '$.strength'), 1.0)) STORED,
    access_count  INTEGER GENERATED ALWAYS AS (COALESCE(json_extract(properties, '$.access_count'), 0)) STORED,
    last_accessed TEXT GENERATED ALWAYS AS (json_extract(properties, '$.last_accessed')) STORED,
    created_at    TEXT GENERATED ALWAYS AS (json_extract(properties, '$.created_at')) STORED,
    decay_rate    REAL GENERATED ALWAYS AS (COALESCE(json_extract(properties, '$.decay_rate'), 0.02)) STORED
);

CREATE TABLE IF NOT EXISTS node_labels (
    node_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    label   TEXT NOT NULL,
    PRIMARY KEY (node_id, label)
);

CREATE TABLE IF NOT EXISTS edges (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    from_id    TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    to_id      TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    type       TEXT NOT NULL,
    weight     REAL NOT NULL DEFAULT 0.5,
    properties TEXT NOT NULL DEFAULT '{}',
    created_at TEXT,
    UNIQUE(from_id, to_id, type)
);

CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT
);

CREATE INDEX IF NOT EXISTS idx_labels_label ON node_labels(label);
CREATE INDEX IF NOT EXISTS idx_nodes_author ON nodes(author);
CREATE INDEX IF NOT EXISTS idx_nodes_strength ON nodes(strength);
CREATE INDEX IF NOT EXISTS idx_nodes_last_accessed ON nodes(last_accessed);
CREATE INDEX IF NOT EXISTS idx_nodes_created_at ON nodes(created_at);
CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_id);
CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id);
CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(type);
"#;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
