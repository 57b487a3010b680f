//! `get_stats()` (spec §6): the engine's self-report — counts, the active
//! vector backend, schema version, and model identity, none of which any
//! single subsystem crate has a complete view of.

use std::collections::BTreeMap;

use engram_core::errors::EngramResult;

use crate::brain::Brain;

#[derive(Debug, Clone, PartialEq)]
pub struct BrainStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub vector_count: usize,
    pub vector_backend: String,
    pub schema_version: u32,
    pub embedding_model: Option<String>,
    pub embedding_dim: Option<usize>,
    pub labels: BTreeMap<String, usize>,
}

impl BrainStats {
    pub(crate) fn collect(brain: &Brain) -> EngramResult<Self> {
        let nodes = brain.get_all_nodes()?;
        let node_count = nodes.len();
        let edge_count = brain.graph().edge_count()?;

        let mut labels: BTreeMap<String, usize> = BTreeMap::new();
        for node in &nodes {
            for label in &node.labels {
                *labels.entry(label.clone()).or_insert(0) += 1;
            }
        }

        let storage = brain.storage();
        let schema_version: u32 = storage
            .get_meta("schema_version")?
            .and_then(|v| v.parse().ok())
            .unwrap_or(engram_storage::migrations::LATEST_VERSION);
        let embedding_model = storage.get_meta("embedding_model_name")?;
        let embedding_dim = storage.get_meta("embedding_model_dim")?.and_then(|v| v.parse().ok());

        Ok(Self {
            node_count,
            edge_count,
            vector_count: brain.vector_count(),
            vector_backend: brain.vector_backend_name().to_string(),
            schema_version,
            embedding_model,
            embedding_dim,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use engram_core::LabelSet;

    use super::*;

    #[test]
    fn stats_reflect_node_and_label_counts() {
        let brain = Brain::open_in_memory().unwrap();
        brain
            .add_memory(
                "A decision",
                "content",
                ["Decision".to_string()].into_iter().collect::<LabelSet>(),
                "",
                None,
                &[],
                None,
            )
            .unwrap();

        let stats = brain.get_stats().unwrap();
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.labels.get("Decision"), Some(&1));
        assert_eq!(stats.vector_backend, "npz");
        assert_eq!(stats.vector_count, 1);
    }
}
