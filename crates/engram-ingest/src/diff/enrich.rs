//! Drives [`super::analyze_diff`] against real commits: one `git2` diff per
//! not-yet-enriched `Commit` node, appended to the node's content as a
//! `--- Diff Summary ---` block (spec §4.4). Separate from the pure parsing
//! module so the state machine and classification rules stay unit-testable
//! without a repository on disk.

use std::path::Path;

use serde_json::Value;

use engram_core::config::IngestConfig;
use engram_core::errors::{EngramResult, IngestError};
use engram_graph::Graph;

use super::analyze_diff;

const DIFF_ENRICHED_AT_KEY: &str = "diff_enriched_at";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffEnrichStats {
    pub enriched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Renders the unified diff for a single commit (identified by the short
/// hash `ingest_commit` stamped on the node) against its first parent.
fn diff_text_for_commit(repo: &git2::Repository, short_hash: &str) -> EngramResult<Option<String>> {
    let Ok(object) = repo.revparse_single(short_hash) else { return Ok(None) };
    let Ok(commit) = object.peel_to_commit() else { return Ok(None) };
    let Ok(tree) = commit.tree() else { return Ok(None) };
    let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

    let mut diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .map_err(|e| IngestError::GitFailed(format!("diff for {short_hash}: {e}")))?;
    diff.find_similar(None)
        .map_err(|e| IngestError::GitFailed(format!("rename detection for {short_hash}: {e}")))?;

    let mut text = String::new();
    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        if line.origin() == '+' || line.origin() == '-' || line.origin() == ' ' {
            text.push(line.origin());
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(|e| IngestError::GitFailed(format!("render diff for {short_hash}: {e}")))?;

    Ok(Some(text))
}

/// Walks every `Commit` node without a `diff_enriched_at` stamp (newest
/// first is not guaranteed here — nodes come back in storage order, capped
/// at `max_commits` per call so a single ingestion pass stays bounded),
/// analyzes its diff, and appends the summary block to its content.
///
/// Embeddings are intentionally not touched here: the facade re-embeds
/// enriched nodes as part of its own ingestion pipeline, the same way it
/// re-embeds after any other content mutation.
pub fn enrich_git_diffs(
    graph: &Graph,
    repo_path: &Path,
    config: &IngestConfig,
    max_commits: usize,
) -> EngramResult<DiffEnrichStats> {
    let repo = git2::Repository::open(repo_path)
        .map_err(|e| IngestError::GitFailed(format!("failed to open repository: {e}")))?;

    let mut stats = DiffEnrichStats::default();
    let commit_nodes = graph.storage().nodes_by_label("Commit")?;

    for node in commit_nodes {
        if stats.enriched + stats.skipped + stats.failed >= max_commits {
            break;
        }
        if node.properties.contains_key(DIFF_ENRICHED_AT_KEY) {
            continue;
        }
        let Some(hash) = node.properties.get("commit_hash").and_then(|v| v.as_str()) else {
            stats.skipped += 1;
            continue;
        };

        match diff_text_for_commit(&repo, hash) {
            Ok(Some(diff_text)) if !diff_text.trim().is_empty() => {
                let summary = analyze_diff(&diff_text, config);
                let mut node = node;

                let new_content = match node.content() {
                    Some(existing) => format!("{existing}\n\n--- Diff Summary ---\n{}", summary.summary_text),
                    None => format!("--- Diff Summary ---\n{}", summary.summary_text),
                };
                node.properties
                    .insert("summary".to_string(), Value::from(engram_core::derive_summary(&new_content)));
                node.properties.insert("content".to_string(), Value::from(new_content));
                node.properties
                    .insert("change_shape".to_string(), Value::from(summary.change_shape.as_str()));
                node.properties
                    .insert("diff_files_changed".to_string(), Value::from(summary.diff_stats.files_changed));
                node.properties
                    .insert("diff_insertions".to_string(), Value::from(summary.diff_stats.insertions));
                node.properties
                    .insert("diff_deletions".to_string(), Value::from(summary.diff_stats.deletions));
                node.properties
                    .insert(DIFF_ENRICHED_AT_KEY.to_string(), Value::from(chrono::Utc::now().to_rfc3339()));

                graph.storage().upsert_node(&node)?;
                stats.enriched += 1;
            }
            Ok(_) => stats.skipped += 1,
            Err(_) => stats.failed += 1,
        }
    }

    Ok(stats)
}
