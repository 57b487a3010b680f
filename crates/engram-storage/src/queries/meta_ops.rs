//! Generic key/value access over the `meta` table: schema version (owned by
//! `migrations`) plus arbitrary subsystem state such as the embedding
//! model-identity guard (spec §4.2 "Model-identity guard").

use rusqlite::{params, Connection, OptionalExtension};

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>, String> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(|e| e.to_string())
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<(), String> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(|e| e.to_string())?;
    Ok(())
}
