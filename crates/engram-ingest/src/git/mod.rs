//! Git log ingestion: walks commit history with `git2`, classifies each
//! commit as a conventional-commit type, and ingests it as an
//! `{Episode, Commit, ...}` node — ported from
//! `original_source/.claude/brain/populate.py::parse_git_commits`/`populate_commits`,
//! restructured around `git2::Repository::revwalk` in the style of a
//! `GitAnalyzer`.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use engram_core::config::IngestConfig;
use engram_core::errors::{EngramResult, IngestError};
use engram_graph::Graph;

use crate::markdown::extract_typed_references;

static COMMIT_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(feat|fix|docs|style|refactor|test|chore|perf|ci|build|revert)[(:]").unwrap());
static SCOPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+\(([^)]+)\)").unwrap());
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommit {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub date: String,
    pub subject: String,
    pub body: String,
    pub commit_type: String,
    pub scope: Option<String>,
    pub files: Vec<String>,
}

/// Walks up to `max_commits` commits from `HEAD` in `repo_path`, newest
/// first, fetching at most `config.max_files_per_commit_fetched` changed
/// file paths per commit (spec §4.4 "file cap (10 fetched, 5 kept)").
pub fn walk_commits(repo_path: &Path, max_commits: usize, config: &IngestConfig) -> EngramResult<Vec<ParsedCommit>> {
    let repo = git2::Repository::open(repo_path)
        .map_err(|e| IngestError::GitFailed(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| IngestError::GitFailed(format!("failed to create revwalk: {e}")))?;
    revwalk
        .push_head()
        .map_err(|e| IngestError::GitFailed(format!("failed to push HEAD: {e}")))?;
    revwalk
        .set_sorting(git2::Sort::TIME)
        .map_err(|e| IngestError::GitFailed(format!("failed to set sorting: {e}")))?;

    let mut commits = Vec::new();

    for (i, oid_result) in revwalk.enumerate() {
        if i >= max_commits {
            break;
        }
        let Ok(oid) = oid_result else { continue };
        let Ok(commit) = repo.find_commit(oid) else { continue };
        // --no-merges: skip anything with more than one parent.
        if commit.parent_count() > 1 {
            continue;
        }

        let subject = commit.summary().unwrap_or("").to_string();
        let body = commit
            .body()
            .or_else(|| commit.message().and_then(|m| m.split_once('\n').map(|(_, rest)| rest)))
            .unwrap_or("")
            .trim()
            .to_string();

        let author = commit.author();
        let author_name = author.name().unwrap_or("unknown").to_string();
        let author_email = author.email().unwrap_or("").to_string();
        let date = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let subject_lower = subject.to_lowercase();
        let commit_type = COMMIT_TYPE_RE
            .captures(&subject_lower)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "other".to_string());
        let scope = SCOPE_RE.captures(&subject_lower).map(|c| c[1].to_string());

        let files = diff_file_paths(&repo, &commit, config.max_files_per_commit_fetched);

        commits.push(ParsedCommit {
            hash: oid.to_string()[..8.min(oid.to_string().len())].to_string(),
            author_name,
            author_email,
            date,
            subject,
            body,
            commit_type,
            scope,
            files,
        });
    }

    Ok(commits)
}

fn diff_file_paths(repo: &git2::Repository, commit: &git2::Commit, cap: usize) -> Vec<String> {
    let Ok(tree) = commit.tree() else { return Vec::new() };
    let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

    let Ok(diff) = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None) else {
        return Vec::new();
    };

    let mut files = Vec::new();
    let _ = diff.foreach(
        &mut |delta, _| {
            if files.len() < cap {
                if let Some(path) = delta.new_file().path() {
                    files.push(path.to_string_lossy().to_string());
                }
            }
            true
        },
        None,
        None,
        None,
    );
    files
}

/// `parts[4].split("@").next().lowercase` slugified into `@<username>`,
/// matching `populate_commits`'s `author_username` derivation.
fn commit_author_handle(email: &str) -> String {
    let local_part = email.split('@').next().unwrap_or(email).to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&local_part, "-");
    format!("@{slug}")
}

fn commit_labels(commit: &ParsedCommit) -> engram_core::LabelSet {
    let mut labels: engram_core::LabelSet = ["Episode", "Commit"].into_iter().map(String::from).collect();

    let type_label = match commit.commit_type.as_str() {
        "feat" => Some("Feature"),
        "fix" => Some("BugFix"),
        "refactor" => Some("Refactor"),
        "docs" => Some("Documentation"),
        "test" => Some("Testing"),
        "perf" => Some("Performance"),
        _ => None,
    };
    if let Some(label) = type_label {
        labels.insert(label.to_string());
    }

    if let Some(scope) = &commit.scope {
        let title_cased = scope.replace(['-', '_'], "");
        let scope_label = title_cased
            .chars()
            .enumerate()
            .map(|(i, c)| if i == 0 { c.to_ascii_uppercase() } else { c })
            .collect::<String>();
        if !scope_label.is_empty() && scope_label.len() < 30 {
            labels.insert(format!("{scope_label}Domain"));
        }
    }

    labels
}

fn commit_content(commit: &ParsedCommit) -> String {
    let files_summary = if commit.files.is_empty() {
        "N/A".to_string()
    } else {
        commit.files.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
    };
    format!("{}\n\n{}\n\n**Files changed:** {}", commit.subject, commit.body, files_summary)
        .trim()
        .to_string()
}

/// Ingests a single parsed commit as an `{Episode, Commit, ...}` node.
pub fn ingest_commit(graph: &Graph, commit: &ParsedCommit) -> EngramResult<String> {
    let content = commit_content(commit);
    let labels = commit_labels(commit);
    let author = commit_author_handle(&commit.author_email);
    let refs = extract_typed_references(&content);

    let mut props = Map::new();
    props.insert("commit_hash".to_string(), Value::from(commit.hash.clone()));
    props.insert("date".to_string(), Value::from(commit.date.clone()));
    props.insert("commit_type".to_string(), Value::from(commit.commit_type.clone()));
    props.insert("scope".to_string(), commit.scope.clone().map(Value::from).unwrap_or(Value::Null));
    props.insert("files_count".to_string(), Value::from(commit.files.len()));
    props.insert(
        "files".to_string(),
        Value::from(commit.files.iter().take(5).cloned().collect::<Vec<_>>()),
    );

    graph.add_memory(
        &truncate_chars(&commit.subject, 100),
        &content,
        labels,
        &author,
        Some(props),
        &refs,
    )
}

/// Walks and ingests up to `max_commits` commits from `repo_path`, returning
/// the count of nodes added or updated.
pub fn ingest_git_log(graph: &Graph, repo_path: &Path, max_commits: usize, config: &IngestConfig) -> EngramResult<usize> {
    let commits = walk_commits(repo_path, max_commits, config)?;
    let mut count = 0;
    for commit in &commits {
        ingest_commit(graph, commit)?;
        count += 1;
    }
    Ok(count)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(commit_type: &str, scope: Option<&str>) -> ParsedCommit {
        ParsedCommit {
            hash: "abc12345".to_string(),
            author_name: "Jane Doe".to_string(),
            author_email: "jane.doe@example.com".to_string(),
            date: "2024-01-15".to_string(),
            subject: format!("{commit_type}{}: did a thing", scope.map(|s| format!("({s})")).unwrap_or_default()),
            body: "".to_string(),
            commit_type: commit_type.to_string(),
            scope: scope.map(String::from),
            files: vec!["src/auth.rs".to_string()],
        }
    }

    #[test]
    fn classifies_type_and_scope_into_labels() {
        let c = commit("fix", Some("auth"));
        let labels = commit_labels(&c);
        assert!(labels.contains("BugFix"));
        assert!(labels.contains("AuthDomain"));
    }

    #[test]
    fn author_handle_slugifies_the_local_part() {
        assert_eq!(commit_author_handle("jane.doe@example.com"), "@jane-doe");
    }

    #[test]
    fn content_includes_files_changed_summary() {
        let c = commit("feat", None);
        let content = commit_content(&c);
        assert!(content.contains("**Files changed:** src/auth.rs"));
    }

    #[test]
    fn ingest_commit_creates_an_episode_commit_node() {
        let storage = std::sync::Arc::new(engram_storage::StorageEngine::open_in_memory().unwrap());
        let graph = Graph::new(storage);
        let c = commit("fix", Some("payments"));
        let id = ingest_commit(&graph, &c).unwrap();
        let node = graph.get_node(&id).unwrap().unwrap();
        assert!(node.has_label("Commit"));
        assert!(node.has_label("BugFix"));
        assert!(node.has_label("PaymentsDomain"));
        assert_eq!(node.properties.get("commit_hash").and_then(|v| v.as_str()), Some("abc12345"));
    }
}
