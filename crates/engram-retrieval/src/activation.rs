//! Spreading activation over the graph (spec §4.5 "Spreading activation").
//!
//! Starting from a seed set with activation 1.0, fans out breadth-first up
//! to `max_depth` hops. Forward edges carry full `decay`, backward edges
//! (walking an edge against its direction) carry half that, and every hop
//! is additionally scaled by the target node's own memory strength — a weak
//! memory barely propagates activation even across a strong edge.

use std::collections::{HashMap, HashSet, VecDeque};

use engram_core::errors::EngramResult;
use engram_graph::Graph;

/// Runs spreading activation from `seeds` and returns every node reached
/// (including the seeds themselves, at activation `1.0`) mapped to its
/// final activation level.
///
/// Rule: `activation[v] := max(activation[v], a')` at each hop, so a
/// node reached by multiple paths keeps its strongest one. Traversal is
/// frontier-by-frontier (one [`Graph::neighbors`] call per frontier node,
/// not a single batched join per depth — the existing `Graph`/`StorageEngine`
/// surface has no batched-frontier query, so this trades a constant-factor
/// query count for reusing the settled per-node API).
pub fn spreading_activation(
    graph: &Graph,
    seeds: &[String],
    max_depth: u32,
    decay: f64,
) -> EngramResult<HashMap<String, f64>> {
    let mut activation: HashMap<String, f64> = HashMap::new();
    for seed in seeds {
        activation.insert(seed.clone(), 1.0);
    }

    let mut frontier: Vec<String> = seeds.to_vec();
    let mut visited: HashSet<String> = seeds.iter().cloned().collect();

    for _ in 0..max_depth {
        if frontier.is_empty() {
            break;
        }
        let mut next_frontier = VecDeque::new();

        for node in &frontier {
            let a_u = *activation.get(node).unwrap_or(&0.0);
            if a_u <= 0.0 {
                continue;
            }

            for edge in graph.storage().outgoing_edges(node)? {
                let target_strength = graph.storage().node_strength(&edge.to_id)?.unwrap_or(0.0);
                let a_prime = a_u * edge.weight * decay * target_strength;
                let entry = activation.entry(edge.to_id.clone()).or_insert(0.0);
                *entry = entry.max(a_prime);
                if visited.insert(edge.to_id.clone()) {
                    next_frontier.push_back(edge.to_id);
                }
            }

            for edge in graph.storage().incoming_edges(node)? {
                let target_strength = graph.storage().node_strength(&edge.from_id)?.unwrap_or(0.0);
                let a_prime = a_u * edge.weight * decay * 0.5 * target_strength;
                let entry = activation.entry(edge.from_id.clone()).or_insert(0.0);
                *entry = entry.max(a_prime);
                if visited.insert(edge.from_id.clone()) {
                    next_frontier.push_back(edge.from_id);
                }
            }
        }

        frontier = next_frontier.into_iter().collect();
    }

    Ok(activation)
}
