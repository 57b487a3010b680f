//! `PATTERNS.md` parsing: approved patterns (`{Pattern, ApprovedPattern}`)
//! and anti-patterns (`{Pattern, AntiPattern}`), classified by which section
//! header they fall under — ported from
//! `original_source/.claude/brain/populate.py::parse_patterns`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use engram_core::errors::EngramResult;
use engram_graph::Graph;

use super::extract_typed_references;

static APPROVED_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)## Padrões Aprovados.*?\n(.+?)(?:\n## Anti|$)").unwrap());
static ANTI_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)## Anti-patterns.*?\n(.+?)(?:\n## |$)").unwrap());
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)### (.+?)\n(.+?)(?=\n###|\n## |$)").unwrap());
static PAT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(PAT-\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Approved,
    Anti,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPattern {
    pub kind: PatternKind,
    pub name: String,
    pub description: String,
}

fn extract_entries(section: &str, kind: PatternKind) -> Vec<ParsedPattern> {
    ENTRY_RE
        .captures_iter(section)
        .map(|c| ParsedPattern { kind, name: c[1].trim().to_string(), description: c[2].trim().to_string() })
        .collect()
}

/// Parses both the "Padrões Aprovados" and "Anti-patterns" sections out of a
/// `PATTERNS.md`-shaped document.
pub fn parse_patterns(content: &str) -> Vec<ParsedPattern> {
    let mut patterns = Vec::new();

    if let Some(section) = APPROVED_SECTION_RE.captures(content) {
        patterns.extend(extract_entries(&section[1], PatternKind::Approved));
    }
    if let Some(section) = ANTI_SECTION_RE.captures(content) {
        patterns.extend(extract_entries(&section[1], PatternKind::Anti));
    }

    patterns
}

/// Parses and ingests every pattern entry, returning the number added or
/// updated.
pub fn ingest_patterns(graph: &Graph, content: &str) -> EngramResult<usize> {
    let mut count = 0;

    for pattern in parse_patterns(content) {
        let mut labels: engram_core::LabelSet = ["Pattern"].into_iter().map(String::from).collect();
        labels.insert(
            match pattern.kind {
                PatternKind::Approved => "ApprovedPattern",
                PatternKind::Anti => "AntiPattern",
            }
            .to_string(),
        );

        let mut props = Map::new();
        if let Some(pat_id) = PAT_ID_RE.captures(&pattern.name) {
            props.insert("pat_id".to_string(), Value::from(pat_id[1].to_string()));
        }

        let refs = extract_typed_references(&pattern.description);
        graph.add_memory(
            &pattern.name,
            &pattern.description,
            labels,
            "@engram",
            if props.is_empty() { None } else { Some(props) },
            &refs,
        )?;
        count += 1;
    }

    Ok(count)
}
