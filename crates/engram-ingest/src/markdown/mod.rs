//! Markdown ingestion (spec §4.4): section-aware extractors for ADRs,
//! domain glossaries/rules/entities/constraints, approved/anti patterns, and
//! experience-library entries. Each submodule mirrors the split the original
//! `populate.py` uses: a pure `parse_*` function returning structured
//! records, and an `ingest_*` function that folds those records into the
//! graph via `engram_graph::Graph::add_memory`.

pub mod adr;
pub mod domain;
pub mod experiences;
pub mod patterns;

use once_cell::sync::Lazy;
use regex::Regex;

static ADR_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bADR-(\d+)\b").unwrap());
static PAT_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPAT-(\d+)\b").unwrap());
static EXP_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bEXP-(\d+)\b").unwrap());

/// Scans `content` for `ADR-NNN`/`PAT-NNN`/`EXP-NNN` tokens (zero-padded to
/// 3 digits, matching the original `_extract_references`) and returns them
/// deduplicated. `[[wikilinks]]` are deliberately NOT included here —
/// `Graph::add_memory` already scans `content` for those itself, so this
/// only needs to surface the typed ids it can't find on its own.
pub fn extract_typed_references(content: &str) -> Vec<String> {
    let mut refs = std::collections::BTreeSet::new();

    for caps in ADR_REF_RE.captures_iter(content) {
        refs.insert(format!("ADR-{:0>3}", &caps[1]));
    }
    for caps in PAT_REF_RE.captures_iter(content) {
        refs.insert(format!("PAT-{:0>3}", &caps[1]));
    }
    for caps in EXP_REF_RE.captures_iter(content) {
        refs.insert(format!("EXP-{:0>3}", &caps[1]));
    }

    refs.into_iter().collect()
}

/// A template id contains the literal placeholder `NNN` (spec §4.4 "Templates
/// ... are skipped").
pub fn is_template_id(id: &str) -> bool {
    id.contains("NNN")
}
