//! Calibrate phase (spec §4.6 "Calibrate"): boosts heavily-accessed semantic
//! edges, decays untouched ones, and leaves structural edges alone.

use std::collections::HashMap;

use engram_core::config::ConsolidationConfig;
use engram_core::errors::EngramResult;
use engram_core::{Edge, EdgeType};
use engram_graph::Graph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrateStats {
    pub boosted: usize,
    pub decayed: usize,
}

pub fn calibrate(graph: &Graph, config: &ConsolidationConfig) -> EngramResult<CalibrateStats> {
    let nodes = graph.storage().all_nodes()?;
    let access_counts: HashMap<&str, u64> = nodes.iter().map(|n| (n.id.as_str(), n.memory.access_count)).collect();

    let mut stats = CalibrateStats::default();

    for edge_type in EdgeType::ALL {
        if edge_type.is_structural() {
            continue;
        }
        for edge in graph.storage().edges_by_type(edge_type)? {
            let summed_access = access_counts.get(edge.from_id.as_str()).copied().unwrap_or(0)
                + access_counts.get(edge.to_id.as_str()).copied().unwrap_or(0);

            if summed_access > config.calibrate_access_threshold {
                let boosted = (edge.weight * config.calibrate_boost_factor).min(1.0);
                set_edge_weight(graph, &edge, boosted)?;
                stats.boosted += 1;
            } else if summed_access == 0 && edge.weight > config.calibrate_decay_ceiling {
                let decayed = (edge.weight * config.calibrate_decay_factor).max(config.calibrate_decay_floor);
                set_edge_weight(graph, &edge, decayed)?;
                stats.decayed += 1;
            }
        }
    }

    Ok(stats)
}

/// `upsert_edge` only ever raises a weight (max-merge on the unique key), so
/// calibrate's decay branch needs a direct `SET` rather than the upsert path.
fn set_edge_weight(graph: &Graph, edge: &Edge, weight: f64) -> EngramResult<()> {
    let from_id = edge.from_id.clone();
    let to_id = edge.to_id.clone();
    let type_name = edge.edge_type.as_str().to_string();
    graph.storage().with_conn(|conn| {
        conn.execute(
            "UPDATE edges SET weight = ?1 WHERE from_id = ?2 AND to_id = ?3 AND type = ?4",
            rusqlite::params![weight, from_id, to_id, type_name],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    })
}
