use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The memory-strength envelope carried by every node (spec §3 "memory").
///
/// `strength` only decreases under decay and only increases under
/// reinforcement (`* 1.05`, clamped) or a consolidation boost
/// (`* 1.1`/`* 1.15`, clamped) — see §8 invariant 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub strength: f64,
    pub access_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub decay_rate: f64,
}

impl MemoryState {
    pub fn new(now: DateTime<Utc>, decay_rate: f64) -> Self {
        Self {
            strength: 1.0,
            access_count: 1,
            last_accessed: Some(now),
            created_at: now,
            decay_rate,
        }
    }

    /// Reinforce on retrieval: bump access count, refresh recency, and grow
    /// strength multiplicatively, clamped at 1.0.
    pub fn reinforce(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed = Some(now);
        self.strength = (self.strength * 1.05).min(1.0);
    }

    /// Consolidation boost (calibrate phase): `weight := min(1, w * factor)`,
    /// reused here for strength-side boosts where a phase wants the same
    /// clamped-multiply shape.
    pub fn boost(&mut self, factor: f64) {
        self.strength = (self.strength * factor).min(1.0);
    }
}
