//! `EXPERIENCE_LIBRARY.md` parsing: `{Episode, Experience}` nodes with an
//! `exp_id` property — ported from
//! `original_source/.claude/brain/populate.py::populate_experiences` (which
//! inlines its own parsing rather than delegating to a `parse_*` helper).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use engram_core::errors::EngramResult;
use engram_graph::Graph;

use super::{extract_typed_references, is_template_id};

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"## (EXP-\d+): (.+)").unwrap());
static CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*Contexto\*\*: (.+?)(?=\n\*\*|\n---|\n## |$)").unwrap());
static APPROACH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*Abordagem\*\*:\s*\n(.+?)(?=\n\*\*|\n---|\n## |$)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExperience {
    pub id: String,
    pub title: String,
    pub context: String,
    pub approach: String,
    pub raw_section: String,
}

/// Splits an `EXPERIENCE_LIBRARY.md`-shaped document on `---` separators and
/// extracts each experience's context/approach.
pub fn parse_experiences(content: &str) -> Vec<ParsedExperience> {
    content
        .split("\n---\n")
        .filter_map(|section| {
            let header = HEADER_RE.captures(section)?;
            let id = header[1].to_string();
            let title = header[2].trim().to_string();

            let context = CONTEXT_RE.captures(section).map(|c| c[1].trim().to_string()).unwrap_or_default();
            let approach = APPROACH_RE.captures(section).map(|c| c[1].trim().to_string()).unwrap_or_default();

            Some(ParsedExperience { id, title, context, approach, raw_section: section.to_string() })
        })
        .collect()
}

/// Parses and ingests every non-template experience, returning the number
/// of nodes added or updated.
pub fn ingest_experiences(graph: &Graph, content: &str) -> EngramResult<usize> {
    let mut count = 0;

    for exp in parse_experiences(content) {
        if is_template_id(&exp.id) {
            continue;
        }

        let body = format!("{}\n{}", exp.context, exp.approach).trim().to_string();
        let refs = extract_typed_references(&exp.raw_section);

        let mut props = Map::new();
        props.insert("exp_id".to_string(), Value::from(exp.id.clone()));

        graph.add_memory(
            &format!("{}: {}", exp.id, exp.title),
            &body,
            ["Episode", "Experience"].into_iter().map(String::from).collect(),
            "@engram",
            Some(props),
            &refs,
        )?;
        count += 1;
    }

    Ok(count)
}
