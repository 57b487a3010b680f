//! Full-text search over nodes: FTS5 BM25 when available, LIKE fallback
//! otherwise (spec §5.1, §7 BackendInitFailure degrade path).

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};

/// A single full-text hit: node id plus a relevance score. For FTS5 this is
/// the (negated, already-ascending) `bm25()` score; for the LIKE fallback it
/// is a fixed constant so every hit ranks equally before fusion re-scores it.
#[derive(Debug, Clone)]
pub struct TextHit {
    pub node_id: String,
    pub score: f64,
}

fn fts5_available(conn: &Connection) -> bool {
    conn.prepare("SELECT 1 FROM nodes_fts LIMIT 0")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false)
}

/// Search titles/content/summary with the configured BM25 column weights
/// (title, content, summary) from `RetrievalConfig::bm25_weights`.
pub fn fts_search(
    conn: &Connection,
    query: &str,
    limit: usize,
    bm25_weights: (f64, f64, f64),
) -> Result<Vec<TextHit>, String> {
    if fts5_available(conn) {
        if let Some(hits) = fts5_search(conn, query, limit, bm25_weights)? {
            return Ok(hits);
        }
    }
    like_search(conn, query, limit)
}

/// Returns `None` when the sanitized query is empty (nothing to MATCH on) so
/// the caller falls through to the LIKE path instead of running a no-op scan.
fn fts5_search(
    conn: &Connection,
    query: &str,
    limit: usize,
    (title_w, content_w, summary_w): (f64, f64, f64),
) -> Result<Option<Vec<TextHit>>, String> {
    let Some(match_expr) = sanitize_fts_query(query) else {
        return Ok(None);
    };

    let sql = "SELECT n.id, bm25(nodes_fts, ?2, ?3, ?4) AS rank
               FROM nodes_fts
               JOIN nodes n ON n.rowid = nodes_fts.rowid
               WHERE nodes_fts MATCH ?1
               ORDER BY rank
               LIMIT ?5";

    let mut stmt = conn.prepare(sql).map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map(
            params![match_expr, title_w, content_w, summary_w, limit as i64],
            |row| {
                let id: String = row.get(0)?;
                let rank: f64 = row.get(1)?;
                Ok(TextHit {
                    node_id: id,
                    // bm25() returns lower-is-better; invert so higher is more relevant.
                    score: -rank,
                })
            },
        )
        .map_err(|e| e.to_string())?;

    rows.collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(|e| e.to_string())
}

fn like_search(conn: &Connection, query: &str, limit: usize) -> Result<Vec<TextHit>, String> {
    let pattern = format!("%{}%", query.to_lowercase());
    let mut stmt = conn
        .prepare(
            "SELECT id FROM nodes
             WHERE LOWER(title) LIKE ?1 OR LOWER(content) LIKE ?1 OR LOWER(summary) LIKE ?1
             LIMIT ?2",
        )
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map(params![pattern, limit as i64], |row| {
            Ok(TextHit {
                node_id: row.get(0)?,
                score: 1.0,
            })
        })
        .map_err(|e| e.to_string())?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| e.to_string())
}

static QUOTED_PHRASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w*]+").unwrap());

/// Sanitize a user query into an FTS5 `MATCH` expression (spec §4.5).
///
/// Quoted phrases are preserved as exact-phrase matches; bare words are
/// individually quoted and AND-joined so every term is required; a trailing
/// `*` on a bare word enables prefix search and is left unquoted. Returns
/// `None` if nothing survives sanitization (e.g. an all-punctuation query),
/// signaling the caller to skip FTS5 entirely.
fn sanitize_fts_query(query: &str) -> Option<String> {
    let phrases: Vec<String> = QUOTED_PHRASE_RE
        .captures_iter(query)
        .map(|c| c[1].to_string())
        .collect();
    let remaining = QUOTED_PHRASE_RE.replace_all(query, "");

    let mut parts: Vec<String> = phrases.iter().map(|p| format!("\"{p}\"")).collect();
    for word in WORD_RE.find_iter(&remaining) {
        let word = word.as_str();
        if word.ends_with('*') {
            parts.push(word.to_string());
        } else {
            parts.push(format!("\"{word}\""));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}

pub fn node_strength(conn: &Connection, node_id: &str) -> Result<Option<f64>, String> {
    conn.query_row(
        "SELECT strength FROM nodes WHERE id = ?1",
        params![node_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| e.to_string())
}

/// Find a node id by an arbitrary property, e.g. `adr_id`/`pat_id`/`exp_id`
/// (spec §4.2 "reference resolution"). Comparison is case-insensitive.
pub fn find_node_by_prop(conn: &Connection, prop_name: &str, prop_value: &str) -> Result<Option<String>, String> {
    conn.query_row(
        "SELECT id FROM nodes WHERE UPPER(json_extract(properties, ?1)) = UPPER(?2)",
        params![format!("$.{prop_name}"), prop_value],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| e.to_string())
}

pub fn find_node_by_title_exact(conn: &Connection, title: &str) -> Result<Option<String>, String> {
    conn.query_row(
        "SELECT id FROM nodes WHERE LOWER(title) = LOWER(?1)",
        params![title],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| e.to_string())
}

pub fn find_node_by_title_prefix(conn: &Connection, prefix: &str) -> Result<Option<String>, String> {
    conn.query_row(
        "SELECT id FROM nodes WHERE LOWER(title) LIKE LOWER(?1) || '%'",
        params![prefix],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_words_are_quoted_and_and_joined() {
        assert_eq!(sanitize_fts_query("token refresh").unwrap(), "\"token\" AND \"refresh\"");
    }

    #[test]
    fn quoted_phrase_preserved_exactly() {
        assert_eq!(sanitize_fts_query("\"token refresh\"").unwrap(), "\"token refresh\"");
    }

    #[test]
    fn trailing_star_enables_prefix_search() {
        assert_eq!(sanitize_fts_query("auth*").unwrap(), "auth*");
    }

    #[test]
    fn mixed_phrase_and_bare_words() {
        assert_eq!(
            sanitize_fts_query("\"exact phrase\" other").unwrap(),
            "\"exact phrase\" AND \"other\""
        );
    }

    #[test]
    fn empty_or_punctuation_only_query_is_none() {
        assert!(sanitize_fts_query("").is_none());
        assert!(sanitize_fts_query("   ").is_none());
        assert!(sanitize_fts_query("!!!").is_none());
    }
}
