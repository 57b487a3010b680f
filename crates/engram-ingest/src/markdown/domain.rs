//! `DOMAIN.md` parsing: glossary terms (`{Concept, Glossary}`), business
//! rules (`{Concept, Rule, BusinessRule}` + `rule_id`), entities
//! (`{Concept, Entity}`), and constraints (`{Concept, Constraint}`) — ported
//! from `original_source/.claude/brain/populate.py::parse_domain`. The
//! original prototype never had a `## Restrições` section; constraints are
//! extracted the same way entities are, since spec §4.4 adds the label pair
//! without specifying new syntax.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use engram_core::errors::EngramResult;
use engram_graph::Graph;

static GLOSSARY_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)## Glossário.*?\n(.+?)(?:\n## |$)").unwrap());
static RULES_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)## Regras de Negócio.*?\n(.+?)(?:\n## |$)").unwrap());
static ENTITIES_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)## Entidades.*?\n(.+?)(?:\n## |$)").unwrap());
static CONSTRAINTS_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)## Restrições.*?\n(.+?)(?:\n## |$)").unwrap());

static TERM_DEFINITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*([^*]+)\*\*[:\s]+(.+?)(?=\n\*\*|\n##|\n\n|$)").unwrap());
static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)[-*]\s*\*\*([^*]+)\*\*[:\s]+(.+?)(?=\n[-*]|\n##|\n\n|$)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum DomainConcept {
    Glossary { term: String, definition: String },
    Rule { id: String, description: String },
    Entity { name: String, description: String },
    Constraint { name: String, description: String },
}

fn extract_term_pairs(section: &str) -> Vec<(String, String)> {
    TERM_DEFINITION_RE
        .captures_iter(section)
        .map(|c| (c[1].trim().to_string(), c[2].trim().to_string()))
        .collect()
}

/// Parses glossary terms, business rules, entities, and constraints out of a
/// `DOMAIN.md`-shaped document. Sections not present are simply absent from
/// the result — partial documents are expected (spec §5 "Parser robustness").
pub fn parse_domain(content: &str) -> Vec<DomainConcept> {
    let mut concepts = Vec::new();

    if let Some(section) = GLOSSARY_SECTION_RE.captures(content) {
        for (term, definition) in extract_term_pairs(&section[1]) {
            concepts.push(DomainConcept::Glossary { term, definition });
        }
    }

    if let Some(section) = RULES_SECTION_RE.captures(content) {
        for caps in RULE_RE.captures_iter(&section[1]) {
            concepts.push(DomainConcept::Rule {
                id: caps[1].trim().to_string(),
                description: caps[2].trim().to_string(),
            });
        }
    }

    if let Some(section) = ENTITIES_SECTION_RE.captures(content) {
        for (name, description) in extract_term_pairs(&section[1]) {
            concepts.push(DomainConcept::Entity { name, description });
        }
    }

    if let Some(section) = CONSTRAINTS_SECTION_RE.captures(content) {
        for (name, description) in extract_term_pairs(&section[1]) {
            concepts.push(DomainConcept::Constraint { name, description });
        }
    }

    concepts
}

/// Parses and ingests every domain concept in `content`, returning the
/// number of nodes added or updated.
pub fn ingest_domain(graph: &Graph, content: &str) -> EngramResult<usize> {
    let mut count = 0;

    for concept in parse_domain(content) {
        match concept {
            DomainConcept::Glossary { term, definition } => {
                graph.add_memory(
                    &term,
                    &definition,
                    ["Concept", "Glossary"].into_iter().map(String::from).collect(),
                    "@engram",
                    None,
                    &[],
                )?;
            }
            DomainConcept::Rule { id, description } => {
                let mut props = Map::new();
                props.insert("rule_id".to_string(), Value::from(id.clone()));
                graph.add_memory(
                    &id,
                    &description,
                    ["Concept", "Rule", "BusinessRule"].into_iter().map(String::from).collect(),
                    "@engram",
                    Some(props),
                    &[],
                )?;
            }
            DomainConcept::Entity { name, description } => {
                graph.add_memory(
                    &name,
                    &description,
                    ["Concept", "Entity"].into_iter().map(String::from).collect(),
                    "@engram",
                    None,
                    &[],
                )?;
            }
            DomainConcept::Constraint { name, description } => {
                graph.add_memory(
                    &name,
                    &description,
                    ["Concept", "Constraint"].into_iter().map(String::from).collect(),
                    "@engram",
                    None,
                    &[],
                )?;
            }
        }
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const SAMPLE: &str = "## Glossário\n\n\
**Tenant**: An isolated customer workspace.\n\
**Shard**: A horizontal partition of tenant data.\n\n\
## Regras de Negócio\n\n\
- **RN-001**: Um tenant não pode exceder 1000 usuários.\n\
- **RN-002**: Pagamentos atrasados suspendem o tenant após 30 dias.\n\n\
## Entidades\n\n\
**User**: A person who can authenticate.\n\n\
## Restrições\n\n\
**MaxPayloadSize**: Requests over 10MB are rejected.\n";

    #[test]
    fn parses_all_four_sections() {
        let concepts = parse_domain(SAMPLE);
        assert_eq!(concepts.len(), 6);
        assert!(matches!(concepts[0], DomainConcept::Glossary { .. }));
        assert!(concepts.iter().any(|c| matches!(c, DomainConcept::Rule { id, .. } if id == "RN-001")));
        assert!(concepts.iter().any(|c| matches!(c, DomainConcept::Entity { name, .. } if name == "User")));
        assert!(concepts
            .iter()
            .any(|c| matches!(c, DomainConcept::Constraint { name, .. } if name == "MaxPayloadSize")));
    }

    #[test]
    fn ingest_creates_correctly_labeled_nodes() {
        let storage = Arc::new(engram_storage::StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let count = ingest_domain(&graph, SAMPLE).unwrap();
        assert_eq!(count, 6);
        // 6 concept nodes plus the shared `@engram` author's `Person` node.
        assert_eq!(graph.node_count().unwrap(), 7);
    }

    #[test]
    fn missing_sections_yield_an_empty_result() {
        assert!(parse_domain("# Just a title\n\nSome prose.").is_empty());
    }
}
