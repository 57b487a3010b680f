//! ADR log parsing: `{Decision, ADR}` nodes with an `adr_id` property
//! (spec §4.4; ported from `original_source/.claude/brain/populate.py::parse_adr_log`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use engram_core::errors::EngramResult;
use engram_graph::Graph;

use super::{extract_typed_references, is_template_id};

static ADR_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (ADR-\d+): (.+)$").unwrap());
static DATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*\*Data\*\*: (.+)$").unwrap());
static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*\*Status\*\*: (.+)$").unwrap());
static CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)### Contexto\n(.+?)(?:\n###|\n## |$)").unwrap());
static DECISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)### Decisão\n(.+?)(?:\n###|\n## |$)").unwrap());
static CONSEQUENCES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)### Consequências\n(.+?)(?:\n---|\n## |$)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAdr {
    pub id: String,
    pub title: String,
    pub status: String,
    pub date: Option<String>,
    pub context: String,
    pub decision: String,
    pub consequences: String,
    pub raw_section: String,
}

/// Splits an `ADR_LOG.md`-shaped document on `---` separators and extracts
/// each ADR's header/body sections, tolerating sections that omit a field
/// (block form only — compact `**Contexto**:` ADRs are uncommon enough in
/// practice that the original parser never handled them either, so neither
/// do we).
pub fn parse_adr_log(content: &str) -> Vec<ParsedAdr> {
    content
        .split("\n---\n")
        .filter_map(|section| {
            let header = ADR_HEADER_RE.captures(section)?;
            let id = header[1].to_string();
            let title = header[2].trim().to_string();

            let status = STATUS_RE
                .captures(section)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_else(|| "Aceito".to_string());
            let date = DATA_RE.captures(section).map(|c| c[1].trim().to_string());
            let context = CONTEXT_RE.captures(section).map(|c| c[1].trim().to_string()).unwrap_or_default();
            let decision = DECISION_RE.captures(section).map(|c| c[1].trim().to_string()).unwrap_or_default();
            let consequences =
                CONSEQUENCES_RE.captures(section).map(|c| c[1].trim().to_string()).unwrap_or_default();

            Some(ParsedAdr {
                id,
                title,
                status,
                date,
                context,
                decision,
                consequences,
                raw_section: section.to_string(),
            })
        })
        .collect()
}

/// Parses and ingests every non-template ADR in `content`, returning the
/// number of nodes added or updated.
pub fn ingest_adr_log(graph: &Graph, content: &str) -> EngramResult<usize> {
    let mut count = 0;

    for adr in parse_adr_log(content) {
        if is_template_id(&adr.id) {
            continue;
        }

        let full_content = format!(
            "## Contexto\n{}\n\n## Decisão\n{}\n\n## Consequências\n{}",
            adr.context, adr.decision, adr.consequences
        );
        let refs = extract_typed_references(&format!("{}{}", adr.raw_section, full_content));

        let mut props = Map::new();
        props.insert("adr_id".to_string(), Value::from(adr.id.clone()));
        props.insert("status".to_string(), Value::from(adr.status.clone()));
        if let Some(date) = &adr.date {
            props.insert("date".to_string(), Value::from(date.clone()));
        }

        graph.add_memory(
            &format!("{}: {}", adr.id, adr.title),
            &full_content,
            ["Decision", "ADR"].into_iter().map(String::from).collect(),
            "@engram",
            Some(props),
            &refs,
        )?;
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const SAMPLE: &str = "## ADR-001: Use SQLite for storage\n\
**Data**: 2024-01-15\n\
**Status**: Aceito\n\n\
### Contexto\nNeeded a durable embedded store.\n\n\
### Decisão\nWe chose SQLite with WAL mode.\n\n\
### Consequências\nSimple ops, single-writer constraint.\n\
---\n\
## ADR-NNN: Template\n\
**Data**: YYYY-MM-DD\n\
**Status**: Proposto\n\n\
### Contexto\nTemplate text.\n";

    #[test]
    fn parses_both_adrs_including_the_template() {
        let adrs = parse_adr_log(SAMPLE);
        assert_eq!(adrs.len(), 2);
        assert_eq!(adrs[0].id, "ADR-001");
        assert_eq!(adrs[0].decision, "We chose SQLite with WAL mode.");
        assert_eq!(adrs[1].id, "ADR-NNN");
    }

    #[test]
    fn ingest_skips_the_template_and_creates_a_decision_node() {
        let storage = Arc::new(engram_storage::StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let count = ingest_adr_log(&graph, SAMPLE).unwrap();
        assert_eq!(count, 1);

        let node = graph.get_node(&engram_core::node_id(
            "ADR-001: Use SQLite for storage",
            &["Decision", "ADR"].into_iter().map(String::from).collect(),
        ))
        .unwrap()
        .unwrap();
        assert!(node.has_label("ADR"));
        assert_eq!(node.properties.get("adr_id").and_then(|v| v.as_str()), Some("ADR-001"));
    }
}
