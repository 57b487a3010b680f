//! Schema v2 — FTS5 full-text index over (title, content, summary), kept in
//! sync with `nodes` via triggers (spec §4.1).

use rusqlite::Connection;

use engram_core::errors::EngramResult;

const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS nodes_fts USING fts5(
    title, content, summary,
    content='nodes', content_rowid='rowid',
    tokenize='porter unicode61'
);

CREATE TRIGGER IF NOT EXISTS nodes_ai AFTER INSERT ON nodes BEGIN
    INSERT INTO nodes_fts(rowid, title, content, summary)
    VALUES (new.rowid, new.title, new.content, new.summary);
END;

CREATE TRIGGER IF NOT EXISTS nodes_ad AFTER DELETE ON nodes BEGIN
    INSERT INTO nodes_fts(nodes_fts, rowid, title, content, summary)
    VALUES ('delete', old.rowid, old.title, old.content, old.summary);
END;

CREATE TRIGGER IF NOT EXISTS nodes_au AFTER UPDATE ON nodes BEGIN
    INSERT INTO nodes_fts(nodes_fts, rowid, title, content, summary)
    VALUES ('delete', old.rowid, old.title, old.content, old.summary);
    INSERT INTO nodes_fts(rowid, title, content, summary)
    VALUES (new.rowid, new.title, new.content, new.summary);
END;
"#;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    // FTS5 may be unavailable in some SQLite builds; degrade gracefully
    // rather than block schema setup (BackendInitFailure kind, §7).
    if let Err(e) = conn.execute_batch(FTS_SCHEMA_SQL) {
        tracing::warn!("fts5 index unavailable, full-text search will fall back to LIKE: {e}");
    }
    Ok(())
}
