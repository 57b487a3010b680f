use serde::{Deserialize, Serialize};

/// Configuration for ingestion pipelines (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_file_size_bytes: u64,
    pub max_diff_lines: usize,
    pub max_files_per_commit_fetched: usize,
    pub max_files_per_commit_kept: usize,
    pub diff_summary_max_tokens: usize,
    pub per_commit_timeout_secs: u64,
    pub per_log_batch_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 500 * 1024,
            max_diff_lines: 5000,
            max_files_per_commit_fetched: 10,
            max_files_per_commit_kept: 5,
            diff_summary_max_tokens: 500,
            per_commit_timeout_secs: 30,
            per_log_batch_timeout_secs: 120,
        }
    }
}
