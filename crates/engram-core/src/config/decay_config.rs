use serde::{Deserialize, Serialize};

/// Configuration for Ebbinghaus decay and health scoring (C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub archive_threshold: f64,
    pub weak_memory_threshold: f64,
    pub health_healthy_threshold: f64,
    pub health_attention_threshold: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            archive_threshold: 0.1,
            weak_memory_threshold: 0.3,
            health_healthy_threshold: 0.8,
            health_attention_threshold: 0.5,
        }
    }
}
