//! # engram
//!
//! The facade crate: wires storage (C1), the vector store (C2), the graph
//! API (C3), ingestion (C4), retrieval (C5), sleep/consolidation (C6), and
//! decay/health (C7) behind the single `Brain` handle spec §6 describes as
//! the "small, stable interface" external collaborators (CLIs, generators)
//! consume. Nothing outside this crate should need to reach into the
//! subsystem crates directly.

mod brain;
mod dev_state;
mod export;
mod stats;

pub use brain::Brain;
pub use dev_state::DevState;
pub use export::GraphJson;
pub use stats::BrainStats;

pub use engram_consolidation::{
    CalibrateStats, ConnectStats, ConsolidateStats, DedupStats, GapReport, HealthReport, HealthStatus, InsightCluster,
    PhaseStats, PromoteStats, RelateStats, SleepCycleReport, ThemesStats,
};
pub use engram_core::config::EngramConfig;
pub use engram_core::errors::{EngramError, EngramResult};
pub use engram_core::{Edge, EdgeType, Label, LabelSet, MemoryState, Node};
pub use engram_decay::DecayStats;
pub use engram_ingest::diff::enrich::DiffEnrichStats as DiffStats;
pub use engram_ingest::diff::DiffSummary;
pub use engram_ingest::AstIngestStats;
pub use engram_retrieval::{CompactResult, Connection, Direction, FullResult, RetrievalResult, RetrieveParams, SortBy};
