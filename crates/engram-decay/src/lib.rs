//! # engram-decay
//!
//! Ebbinghaus-style exponential decay of node `strength` (spec §4.7), plus
//! the label bookkeeping (`WeakMemory`, `Archived`) that decay drives. Used
//! both by the sleep cycle's `decay` phase and by ad-hoc `apply_decay()`
//! calls on the facade.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use engram_core::config::DecayConfig;
use engram_core::errors::EngramResult;
use engram_core::{is_archive_protected, Node};
use engram_graph::Graph;

/// Per-node decay outcome, reported back to the caller for stats/logging.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayOutcome {
    pub node_id: String,
    pub previous_strength: f64,
    pub new_strength: f64,
    pub became_weak: bool,
    pub became_unweak: bool,
    pub should_archive: bool,
}

/// Aggregate stats for a single `apply_decay()` run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayStats {
    pub nodes_processed: usize,
    pub nodes_decayed: usize,
    pub newly_weak: usize,
    pub newly_unweak: usize,
    pub newly_archived: usize,
}

pub struct DecayEngine {
    config: DecayConfig,
}

impl Default for DecayEngine {
    fn default() -> Self {
        Self::new(DecayConfig::default())
    }
}

impl DecayEngine {
    pub fn new(config: DecayConfig) -> Self {
        Self { config }
    }

    /// Compute the decay outcome for a single node as of `now`, without
    /// mutating it. Nodes with no `last_accessed` are left unchanged (spec
    /// §8 "Decay on a node with `last_accessed = null` leaves it unchanged").
    pub fn compute(&self, node: &Node, now: DateTime<Utc>) -> Option<DecayOutcome> {
        let last_accessed = node.memory.last_accessed?;
        let days_elapsed = (now - last_accessed).num_seconds() as f64 / 86_400.0;
        let days_elapsed = days_elapsed.max(0.0);

        let previous_strength = node.memory.strength;
        let new_strength =
            (previous_strength * (-node.memory.decay_rate * days_elapsed).exp()).clamp(0.0, 1.0);

        let protected = is_archive_protected(&node.labels);
        let should_archive = !protected && new_strength < self.config.archive_threshold;
        let is_weak = !protected
            && new_strength >= self.config.archive_threshold
            && new_strength < self.config.weak_memory_threshold;

        let was_weak = node.has_label("WeakMemory");

        Some(DecayOutcome {
            node_id: node.id.clone(),
            previous_strength,
            new_strength,
            became_weak: is_weak && !was_weak,
            became_unweak: !is_weak && was_weak,
            should_archive,
        })
    }

    /// Process a batch of nodes in one pass (benchmarked independently of
    /// storage I/O — this is the pure CPU half of `apply_decay`).
    pub fn process_batch(&self, nodes: &[Node], now: DateTime<Utc>) -> Vec<DecayOutcome> {
        nodes.iter().filter_map(|n| self.compute(n, now)).collect()
    }

    /// Apply decay across the whole graph: recompute `strength`, flip the
    /// `WeakMemory` label, and archive (add `Archived`, skipping protected
    /// labels) nodes that fell below the archive threshold.
    pub fn apply_decay(&self, graph: &Graph, now: DateTime<Utc>) -> EngramResult<DecayStats> {
        let nodes = graph.storage().all_nodes()?;
        let mut stats = DecayStats::default();

        for node in nodes {
            stats.nodes_processed += 1;
            let Some(outcome) = self.compute(&node, now) else {
                continue;
            };

            if (outcome.new_strength - outcome.previous_strength).abs() < f64::EPSILON
                && !outcome.became_weak
                && !outcome.became_unweak
                && !outcome.should_archive
            {
                continue;
            }

            let mut updated = node;
            updated.memory.strength = outcome.new_strength;
            stats.nodes_decayed += 1;

            if outcome.became_weak {
                updated.labels.insert("WeakMemory".to_string());
                stats.newly_weak += 1;
            } else if outcome.became_unweak {
                updated.labels.remove("WeakMemory");
                stats.newly_unweak += 1;
            }

            if outcome.should_archive && !updated.has_label("Archived") {
                updated.labels.insert("Archived".to_string());
                stats.newly_archived += 1;
            }

            graph.storage().upsert_node(&updated)?;
        }

        info!(
            processed = stats.nodes_processed,
            decayed = stats.nodes_decayed,
            newly_weak = stats.newly_weak,
            newly_archived = stats.newly_archived,
            "apply_decay complete"
        );
        debug!(?stats, "decay stats");

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use engram_core::MemoryState;
    use std::collections::BTreeSet;

    fn node_with(strength: f64, decay_rate: f64, last_accessed: Option<DateTime<Utc>>, labels: &[&str]) -> Node {
        Node {
            id: "n1".to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            properties: serde_json::Map::new(),
            memory: MemoryState {
                strength,
                access_count: 1,
                last_accessed,
                created_at: Utc::now(),
                decay_rate,
            },
        }
    }

    #[test]
    fn no_last_accessed_is_unchanged() {
        let engine = DecayEngine::default();
        let node = node_with(1.0, 0.02, None, &["Episode"]);
        assert!(engine.compute(&node, Utc::now()).is_none());
    }

    #[test]
    fn strength_decays_exponentially_with_elapsed_days() {
        let engine = DecayEngine::default();
        let now = Utc::now();
        let node = node_with(1.0, 0.1, Some(now - Duration::days(10)), &["Episode"]);
        let outcome = engine.compute(&node, now).unwrap();
        let expected = (-0.1_f64 * 10.0).exp();
        assert!((outcome.new_strength - expected).abs() < 1e-9);
        assert!(outcome.new_strength < outcome.previous_strength);
    }

    #[test]
    fn weak_memory_label_appears_in_the_threshold_band() {
        let engine = DecayEngine::default();
        let now = Utc::now();
        // decay_rate high enough to land strength in [0.1, 0.3) after 5 days.
        let node = node_with(1.0, 0.3, Some(now - Duration::days(5)), &["Episode"]);
        let outcome = engine.compute(&node, now).unwrap();
        assert!(outcome.new_strength >= 0.1 && outcome.new_strength < 0.3);
        assert!(outcome.became_weak);
        assert!(!outcome.should_archive);
    }

    #[test]
    fn protected_labels_never_archive() {
        let engine = DecayEngine::default();
        let now = Utc::now();
        let node = node_with(1.0, 5.0, Some(now - Duration::days(30)), &["Person"]);
        let outcome = engine.compute(&node, now).unwrap();
        assert!(!outcome.should_archive);
        assert!(!outcome.became_weak);
    }

    #[test]
    fn below_archive_threshold_is_flagged_for_archival() {
        let engine = DecayEngine::default();
        let now = Utc::now();
        let node = node_with(1.0, 5.0, Some(now - Duration::days(30)), &["Episode"]);
        let outcome = engine.compute(&node, now).unwrap();
        assert!(outcome.new_strength < 0.1);
        assert!(outcome.should_archive);
    }
}
