use serde::{Deserialize, Serialize};

/// Configuration for the sleep/consolidation phases (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Default ordered sleep cycle (spec §4.6): `connect, relate, themes,
    /// calibrate, decay`. `dedup`, `promote`, `insights`, `gaps` are
    /// optional and must be requested explicitly.
    pub default_phases: Vec<String>,
    pub relate_threshold: f64,
    pub relate_tfidf_candidate_cap: usize,
    pub co_scope_recent_commits: usize,
    pub co_file_recent_commits: usize,
    pub theme_min_commits: usize,
    pub cluster_min_patterns: usize,
    pub calibrate_access_threshold: u64,
    pub calibrate_boost_factor: f64,
    pub calibrate_decay_factor: f64,
    pub calibrate_decay_floor: f64,
    pub calibrate_decay_ceiling: f64,
    pub promote_min_strength: f64,
    pub promote_min_access_count: u64,
    pub promote_min_outgoing_semantic: usize,
    /// Hard cap on new `CO_ACCESSED` edges minted per `consolidate()` call
    /// (spec §5 "Ingestion caps"; spec §9 open question: "fixed in the
    /// source with no configuration... expose it as a named constant").
    pub consolidate_co_access_cap: usize,
    pub consolidate_co_access_window_days: i64,
    pub consolidate_strengthen_factor: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            default_phases: vec![
                "connect".to_string(),
                "relate".to_string(),
                "themes".to_string(),
                "calibrate".to_string(),
                "decay".to_string(),
            ],
            relate_threshold: 0.75,
            relate_tfidf_candidate_cap: 500,
            co_scope_recent_commits: 5,
            co_file_recent_commits: 3,
            theme_min_commits: 3,
            cluster_min_patterns: 2,
            calibrate_access_threshold: 5,
            calibrate_boost_factor: 1.15,
            calibrate_decay_factor: 0.95,
            calibrate_decay_floor: 0.1,
            calibrate_decay_ceiling: 0.2,
            promote_min_strength: 0.9,
            promote_min_access_count: 10,
            promote_min_outgoing_semantic: 3,
            consolidate_co_access_cap: 50,
            consolidate_co_access_window_days: 7,
            consolidate_strengthen_factor: 1.1,
        }
    }
}
