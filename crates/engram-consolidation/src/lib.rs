//! # engram-consolidation
//!
//! Sleep / consolidation phases (dedup, connect, relate, themes, calibrate,
//! promote, insights, gaps), the lightweight periodic `consolidate()` pass,
//! and health scoring (spec §4.6, §4.7).

mod calibrate;
mod connect;
mod consolidate;
mod dedup;
pub mod health;
mod insights;
mod promote;
mod relate;
mod themes;
mod util;

pub use calibrate::{calibrate, CalibrateStats};
pub use connect::{connect, ConnectStats};
pub use consolidate::{consolidate, ConsolidateStats};
pub use dedup::{dedup, DedupStats};
pub use health::{compute_health, HealthReport, HealthStatus};
pub use insights::{gaps, insights, GapReport, InsightCluster};
pub use promote::{promote, PromoteStats};
pub use relate::{relate, RelateStats};
pub use themes::{themes, ThemesStats};

use chrono::Utc;
use engram_core::config::ConsolidationConfig;
use engram_core::errors::{ConsolidationError, EngramResult};
use engram_decay::{DecayEngine, DecayStats};
use engram_embeddings::VectorStore;
use engram_graph::Graph;
use tracing::{info, warn};

/// Stats emitted by a single named phase within a sleep cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseStats {
    Dedup(DedupStats),
    Connect(ConnectStats),
    Relate(RelateStats),
    Themes(ThemesStats),
    Calibrate(CalibrateStats),
    Promote(PromoteStats),
    Insights(Vec<InsightCluster>),
    Gaps(GapReport),
    Decay(DecayStats),
}

/// Outcome of running a full (or partial) sleep cycle. A phase that failed
/// is recorded in `failures` rather than aborting the remaining phases
/// (spec §7: "cross-phase failures do not abort the cycle").
#[derive(Debug, Clone, Default)]
pub struct SleepCycleReport {
    pub phases_run: Vec<String>,
    pub stats: Vec<PhaseStats>,
    pub failures: Vec<(String, String)>,
}

/// Runs the named sleep phases (in the order given, not reordered) and
/// wires in the consolidation config + optional vector store for `relate`.
pub struct ConsolidationEngine {
    config: ConsolidationConfig,
    decay: DecayEngine,
}

impl Default for ConsolidationEngine {
    fn default() -> Self {
        Self::new(ConsolidationConfig::default())
    }
}

impl ConsolidationEngine {
    pub fn new(config: ConsolidationConfig) -> Self {
        let decay = DecayEngine::new(engram_core::config::DecayConfig::default());
        Self { config, decay }
    }

    pub fn with_decay_engine(config: ConsolidationConfig, decay: DecayEngine) -> Self {
        Self { config, decay }
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Runs `phases` in order, isolating each phase's failure so the rest
    /// still run. Pass an empty slice to run `config.default_phases`.
    pub fn sleep_cycle(&self, graph: &Graph, vector_store: Option<&dyn VectorStore>, phases: &[String]) -> SleepCycleReport {
        let ordered: Vec<String> = if phases.is_empty() {
            self.config.default_phases.clone()
        } else {
            phases.to_vec()
        };

        let mut report = SleepCycleReport::default();

        for phase in ordered {
            let outcome = self.run_phase(&phase, graph, vector_store);
            match outcome {
                Ok(stats) => {
                    info!(phase = %phase, "sleep phase complete");
                    report.phases_run.push(phase);
                    report.stats.push(stats);
                }
                Err(err) => {
                    warn!(phase = %phase, error = %err, "sleep phase failed, continuing with remaining phases");
                    report.failures.push((phase, err.to_string()));
                }
            }
        }

        report
    }

    fn run_phase(&self, phase: &str, graph: &Graph, vector_store: Option<&dyn VectorStore>) -> EngramResult<PhaseStats> {
        match phase {
            "dedup" => Ok(PhaseStats::Dedup(dedup(graph)?)),
            "connect" => Ok(PhaseStats::Connect(connect(graph, &self.config)?)),
            "relate" => Ok(PhaseStats::Relate(relate(graph, vector_store, &self.config)?)),
            "themes" => Ok(PhaseStats::Themes(themes(graph, &self.config)?)),
            "calibrate" => Ok(PhaseStats::Calibrate(calibrate(graph, &self.config)?)),
            "promote" => Ok(PhaseStats::Promote(promote(graph, &self.config)?)),
            "insights" => Ok(PhaseStats::Insights(insights(graph)?)),
            "gaps" => Ok(PhaseStats::Gaps(gaps(graph)?)),
            "decay" => Ok(PhaseStats::Decay(self.decay.apply_decay(graph, Utc::now())?)),
            other => Err(ConsolidationError::UnknownPhase(other.to_string()).into()),
        }
    }

    /// The lightweight periodic pass (spec §4.6, final paragraph) — not a
    /// full sleep cycle.
    pub fn consolidate(&self, graph: &Graph) -> EngramResult<ConsolidateStats> {
        consolidate(graph, &self.config)
    }

    pub fn health(&self, graph: &Graph, vector_store: Option<&dyn VectorStore>) -> EngramResult<HealthReport> {
        compute_health(graph, vector_store)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engram_storage::StorageEngine;

    use super::*;

    #[test]
    fn unknown_phase_is_reported_as_a_failure_not_a_panic() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let engine = ConsolidationEngine::default();

        let report = engine.sleep_cycle(&graph, None, &["not-a-real-phase".to_string()]);
        assert!(report.phases_run.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "not-a-real-phase");
    }

    #[test]
    fn default_cycle_runs_every_configured_phase() {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let engine = ConsolidationEngine::default();

        let report = engine.sleep_cycle(&graph, None, &[]);
        assert_eq!(report.phases_run, engine.config().default_phases);
        assert!(report.failures.is_empty());
    }
}
