//! Promote phase (spec §4.6 "Promote (optional)"): well-established
//! episodes are upgraded to concepts in place.

use engram_core::config::ConsolidationConfig;
use engram_core::errors::EngramResult;
use engram_graph::Graph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromoteStats {
    pub promoted: usize,
}

/// Any `Episode` with `strength > promote_min_strength`,
/// `access_count >= promote_min_access_count`, and at least
/// `promote_min_outgoing_semantic` outgoing semantic edges gains the
/// `Concept` and `PromotedEpisode` labels alongside its existing ones.
pub fn promote(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<PromoteStats> {
    let episodes = graph.storage().nodes_by_label("Episode")?;
    let mut promoted = 0;

    for mut episode in episodes {
        if episode.has_label("PromotedEpisode") {
            continue;
        }
        if episode.memory.strength <= config.promote_min_strength {
            continue;
        }
        if episode.memory.access_count < config.promote_min_access_count {
            continue;
        }

        let outgoing_semantic = graph
            .storage()
            .outgoing_edges(&episode.id)?
            .iter()
            .filter(|e| e.edge_type.is_semantic())
            .count();
        if outgoing_semantic < config.promote_min_outgoing_semantic {
            continue;
        }

        episode.labels.insert("Concept".to_string());
        episode.labels.insert("PromotedEpisode".to_string());
        graph.add_node_raw(episode)?;
        promoted += 1;
    }

    Ok(PromoteStats { promoted })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_core::{Edge, EdgeType, LabelSet, MemoryState, Node};
    use engram_storage::StorageEngine;
    use serde_json::{Map, Value};

    use super::*;

    fn episode_node(id: &str, strength: f64, access_count: u64) -> Node {
        let mut properties = Map::new();
        properties.insert("title".to_string(), Value::from(id));
        properties.insert("content".to_string(), Value::from(""));
        properties.insert("summary".to_string(), Value::from(""));
        let mut memory = MemoryState::new(chrono::Utc::now(), 0.01);
        memory.strength = strength;
        memory.access_count = access_count;
        Node {
            id: id.to_string(),
            labels: ["Episode"].into_iter().map(String::from).collect::<LabelSet>(),
            properties,
            memory,
        }
    }

    #[test]
    fn e3_well_established_episode_is_promoted() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(episode_node("ep1", 0.95, 12)).unwrap();
        graph.add_node_raw(episode_node("p1", 0.5, 0)).unwrap();
        graph.add_node_raw(episode_node("p2", 0.5, 0)).unwrap();
        graph.add_node_raw(episode_node("p3", 0.5, 0)).unwrap();
        graph.add_edge(Edge::new("ep1", "p1", EdgeType::References, 0.6)).unwrap();
        graph.add_edge(Edge::new("ep1", "p2", EdgeType::RelatedTo, 0.6)).unwrap();
        graph.add_edge(Edge::new("ep1", "p3", EdgeType::Applies, 0.6)).unwrap();

        let stats = promote(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.promoted, 1);

        let ep1 = graph.get_node("ep1").unwrap().unwrap();
        assert!(ep1.has_label("Concept"));
        assert!(ep1.has_label("PromotedEpisode"));
        assert!(ep1.has_label("Episode"));
    }

    #[test]
    fn episode_below_access_threshold_is_not_promoted() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(episode_node("ep1", 0.95, 2)).unwrap();

        let stats = promote(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.promoted, 0);
    }

    #[test]
    fn episode_without_enough_semantic_fanout_is_not_promoted() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        graph.add_node_raw(episode_node("ep1", 0.95, 12)).unwrap();
        graph.add_node_raw(episode_node("auth1", 0.5, 0)).unwrap();
        graph.add_edge(Edge::new("ep1", "auth1", EdgeType::AuthoredBy, 0.5)).unwrap();

        let stats = promote(&graph, &ConsolidationConfig::default()).unwrap();
        assert_eq!(stats.promoted, 0);
    }
}
