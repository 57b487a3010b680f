//! `[[wikilink]]` extraction and reference resolution (spec §4.2).

use once_cell::sync::Lazy;
use regex::Regex;

use engram_core::errors::EngramResult;
use engram_storage::StorageEngine;

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").unwrap());

/// Extract the link targets out of `[[Target]]` and `[[Target|label]]` forms.
pub fn extract_wikilinks(content: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(content)
        .map(|cap| cap[1].trim().to_string())
        .collect()
}

/// Resolve a link token to a node id, trying in order: `@alias` for people,
/// `ADR-`/`PAT-`/`EXP-` prefixed ids (with a legacy `decision-<n>` fallback
/// for ADRs), a title-prefix match, then an exact (case-insensitive) title
/// match.
pub fn resolve_link(storage: &StorageEngine, link: &str) -> EngramResult<Option<String>> {
    if let Some(alias) = link.strip_prefix('@') {
        let person_id = format!("person-{alias}");
        return Ok(if storage.node_exists(&person_id)? {
            Some(person_id)
        } else {
            None
        });
    }

    let upper = link.to_uppercase();

    if upper.starts_with("ADR-") {
        if let Some(found) = storage.find_node_by_prop("adr_id", &upper)? {
            return Ok(Some(found));
        }
        let legacy = format!("decision-{}", link.to_lowercase());
        if storage.node_exists(&legacy)? {
            return Ok(Some(legacy));
        }
    }

    if upper.starts_with("PAT-") {
        if let Some(found) = storage.find_node_by_prop("pat_id", &upper)? {
            return Ok(Some(found));
        }
    }

    if upper.starts_with("EXP-") {
        if let Some(found) = storage.find_node_by_prop("exp_id", &upper)? {
            return Ok(Some(found));
        }
    }

    if let Some(found) = storage.find_node_by_title_prefix(link)? {
        return Ok(Some(found));
    }

    storage.find_node_by_title_exact(link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_piped_wikilinks() {
        let content = "See [[Auth Decision]] and [[Pattern: retries|the retry pattern]].";
        let links = extract_wikilinks(content);
        assert_eq!(links, vec!["Auth Decision", "Pattern: retries"]);
    }

    #[test]
    fn resolves_adr_legacy_fallback() {
        let storage = StorageEngine::open_in_memory().unwrap();
        let mut properties = serde_json::Map::new();
        properties.insert("title".to_string(), serde_json::json!("Legacy decision"));
        let node = engram_core::Node {
            id: "decision-adr-7".to_string(),
            labels: Default::default(),
            properties,
            memory: engram_core::MemoryState::new(chrono::Utc::now(), 0.001),
        };
        storage.upsert_node(&node).unwrap();

        let resolved = resolve_link(&storage, "ADR-7").unwrap();
        assert_eq!(resolved, Some("decision-adr-7".to_string()));
    }
}
