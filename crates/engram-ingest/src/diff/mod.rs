//! Unified-diff parsing and change-shape classification (spec §4.4 "Diff
//! enrichment"), ported from
//! `original_source/.claude/brain/diff_parser.py`. The `git2`-backed driver
//! lives in [`enrich`]; this module holds the pure, input-to-output parsing
//! and classification pipeline so it can be unit tested without a
//! repository on disk.

pub mod enrich;

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use engram_core::config::IngestConfig;

const SKIP_PATH_PATTERNS: &[&str] = &[
    "node_modules/",
    "vendor/",
    r"\.venv/",
    "__pycache__/",
    r"\.git/",
    "dist/",
    "build/",
    r"\.next/",
    r"\.nuxt/",
    "coverage/",
    r"\.tox/",
    r"\.mypy_cache/",
];

const SKIP_EXTENSIONS: &[&str] = &[
    "lock", "sum", "map", "snap", "svg", "png", "jpg", "jpeg", "gif", "ico", "woff", "woff2",
    "ttf", "eot", "pyc", "pyo", "class", "o", "so", "dylib", "db", "sqlite", "sqlite3",
];

const GENERATED_PATTERNS: &[&str] = &[
    r"package-lock\.json$",
    r"yarn\.lock$",
    r"pnpm-lock\.yaml$",
    r"Gemfile\.lock$",
    r"Cargo\.lock$",
    r"poetry\.lock$",
    r"go\.sum$",
    r"composer\.lock$",
    r"\.generated\.",
    r"_generated\.",
];

static SKIP_PATH_RE: Lazy<Vec<Regex>> =
    Lazy::new(|| SKIP_PATH_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect());
static GENERATED_RE: Lazy<Vec<Regex>> =
    Lazy::new(|| GENERATED_PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect());

/// Should this path be excluded from diff analysis entirely — vendored
/// directories, minified/lockfile/generated artifacts, or known binary
/// extensions (`.min.js`/`.min.css` are covered by the extension check since
/// `Path::extension` on `foo.min.js` returns `js`... so they're matched by
/// the generated-file regexes instead, as in the source).
pub fn should_skip_file(path: &str) -> bool {
    if path.is_empty() || path == "/dev/null" {
        return false;
    }
    if path.ends_with(".min.js") || path.ends_with(".min.css") {
        return true;
    }
    if SKIP_PATH_RE.iter().any(|re| re.is_match(path)) {
        return true;
    }
    let ext = Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    if SKIP_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    GENERATED_RE.iter().any(|re| re.is_match(path))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub header: String,
    pub added_lines: Vec<String>,
    pub removed_lines: Vec<String>,
    pub context_lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub status: FileStatus,
    pub hunks: Vec<Hunk>,
    pub is_binary: bool,
}

impl FileDiff {
    pub fn insertions(&self) -> usize {
        self.hunks.iter().map(|h| h.added_lines.len()).sum()
    }

    pub fn deletions(&self) -> usize {
        self.hunks.iter().map(|h| h.removed_lines.len()).sum()
    }

    /// The primary path: `new_path` unless this side is `/dev/null` (a
    /// deletion), in which case `old_path`.
    pub fn path(&self) -> &str {
        if self.new_path == "/dev/null" {
            &self.old_path
        } else {
            &self.new_path
        }
    }
}

static DIFF_GIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^diff --git a/(.+?) b/(.+)$").unwrap());
static HUNK_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@\s*(.*)").unwrap());

/// Parses unified-diff text (e.g. the body of `git log -p`) into per-file
/// structures. A state machine over `HEADER`/`HUNK` modes, matching the
/// prototype line for line; lines past `max_lines` are dropped rather than
/// erroring so a pathological diff degrades instead of hanging.
pub fn parse_unified_diff(diff_text: &str, max_lines: usize) -> Vec<FileDiff> {
    let mut files = Vec::new();
    let mut current_file: Option<FileDiff> = None;
    let mut current_hunk: Option<Hunk> = None;

    for (i, line) in diff_text.split('\n').enumerate() {
        if i >= max_lines {
            break;
        }

        if line.starts_with("diff --git") {
            if let (Some(hunk), Some(file)) = (current_hunk.take(), current_file.as_mut()) {
                file.hunks.push(hunk);
            }
            if let Some(file) = current_file.take() {
                files.push(file);
            }
            current_file = Some(match DIFF_GIT_RE.captures(line) {
                Some(caps) => FileDiff {
                    old_path: caps[1].to_string(),
                    new_path: caps[2].to_string(),
                    status: FileStatus::Modified,
                    hunks: Vec::new(),
                    is_binary: false,
                },
                None => FileDiff {
                    old_path: String::new(),
                    new_path: String::new(),
                    status: FileStatus::Modified,
                    hunks: Vec::new(),
                    is_binary: false,
                },
            });
            continue;
        }

        let Some(file) = current_file.as_mut() else { continue };

        if line.starts_with("Binary files") {
            file.is_binary = true;
            continue;
        }
        if line.starts_with("new file mode") {
            file.status = FileStatus::Added;
            continue;
        }
        if line.starts_with("deleted file mode") {
            file.status = FileStatus::Deleted;
            continue;
        }
        if line.starts_with("rename from") || line.starts_with("similarity index") {
            file.status = FileStatus::Renamed;
            continue;
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            let path = rest.strip_prefix("a/").unwrap_or(rest);
            if path == "/dev/null" {
                file.status = FileStatus::Added;
            }
            file.old_path = path.to_string();
            continue;
        }
        if let Some(rest) = line.strip_prefix("+++ ") {
            let path = rest.strip_prefix("b/").unwrap_or(rest);
            if path == "/dev/null" {
                file.status = FileStatus::Deleted;
            }
            file.new_path = path.to_string();
            continue;
        }

        if let Some(caps) = HUNK_HEADER_RE.captures(line) {
            if let Some(hunk) = current_hunk.take() {
                file.hunks.push(hunk);
            }
            current_hunk = Some(Hunk {
                old_start: caps[1].parse().unwrap_or(0),
                old_count: caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1),
                new_start: caps[3].parse().unwrap_or(0),
                new_count: caps.get(4).and_then(|m| m.as_str().parse().ok()).unwrap_or(1),
                header: caps[5].trim().to_string(),
                ..Default::default()
            });
            continue;
        }

        if let Some(hunk) = current_hunk.as_mut() {
            if let Some(added) = line.strip_prefix('+') {
                hunk.added_lines.push(added.to_string());
            } else if let Some(removed) = line.strip_prefix('-') {
                hunk.removed_lines.push(removed.to_string());
            } else if let Some(ctx) = line.strip_prefix(' ') {
                hunk.context_lines.push(ctx.to_string());
            }
        }
    }

    if let (Some(hunk), Some(file)) = (current_hunk, current_file.as_mut()) {
        file.hunks.push(hunk);
    }
    if let Some(file) = current_file {
        files.push(file);
    }

    files
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolChange {
    pub kind: SymbolKind,
    pub name: String,
    pub change_type: ChangeType,
    pub file_path: String,
}

/// Language-spanning symbol-definition patterns, first-match-wins per line
/// (spec §4.4, ported verbatim from `SYMBOL_PATTERNS`).
static SYMBOL_PATTERNS: Lazy<Vec<(Regex, SymbolKind)>> = Lazy::new(|| {
    use SymbolKind::*;
    [
        // Python
        (r"^\s*def\s+(\w+)\s*\(", Function),
        (r"^\s*async\s+def\s+(\w+)\s*\(", Function),
        (r"^\s*class\s+(\w+)", Class),
        // JavaScript / TypeScript
        (r"^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)", Function),
        (r"^\s*(?:export\s+)?(?:default\s+)?class\s+(\w+)", Class),
        (r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(", Function),
        (r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?function", Function),
        (r"^\s*(?:export\s+)?interface\s+(\w+)", Interface),
        (r"^\s*(?:export\s+)?type\s+(\w+)\s*=", Interface),
        // Ruby
        (r"^\s*def\s+(\w+)", Function),
        (r"^\s*module\s+(\w+)", Class),
        // Go
        (r"^\s*func\s+(?:\(\w+\s+\*?\w+\)\s+)?(\w+)\s*\(", Function),
        (r"^\s*type\s+(\w+)\s+struct", Class),
        (r"^\s*type\s+(\w+)\s+interface", Interface),
        // Java / Rust / PHP
        (
            r"^\s*(?:public|private|protected|static|final|abstract|async)?\s*(?:public|private|protected|static|final|abstract|async)?\s*(?:\w+\s+)?(\w+)\s*\([^)]*\)\s*(?:throws\s+\w+\s*)?\{",
            Function,
        ),
        (r"^\s*(?:pub\s+)?(?:async\s+)?fn\s+(\w+)", Function),
        (r"^\s*(?:pub\s+)?struct\s+(\w+)", Class),
        (r"^\s*(?:pub\s+)?trait\s+(\w+)", Interface),
        (r"^\s*(?:pub\s+)?enum\s+(\w+)", Class),
        (r"^\s*(?:pub\s+)?impl\s+(?:\w+\s+for\s+)?(\w+)", Class),
    ]
    .into_iter()
    .map(|(pat, kind)| (Regex::new(pat).unwrap(), kind))
    .collect()
});

/// Detects symbol definitions across `lines`, first pattern match per line
/// wins, deduplicated by `(kind, name)` — matching `_detect_symbols_in_lines`.
fn detect_symbols_in_lines(lines: &[String]) -> Vec<(SymbolKind, String)> {
    let mut symbols = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for line in lines {
        let stripped = line.trim_end();
        for (pattern, kind) in SYMBOL_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(stripped) {
                let name = caps[1].to_string();
                let key = (*kind, name.clone());
                if seen.insert(key) {
                    symbols.push((*kind, name));
                }
                break;
            }
        }
    }

    symbols
}

/// Classifies per-hunk added/removed symbols into added/modified/deleted
/// buckets, falling back to hunk-header context when a hunk carried content
/// but no symbol was detected directly (spec §4.4, ported from
/// `classify_symbols`).
pub fn classify_symbols(
    file_diffs: &[FileDiff],
) -> (Vec<SymbolChange>, Vec<SymbolChange>, Vec<SymbolChange>) {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for fd in file_diffs {
        if fd.is_binary || should_skip_file(fd.path()) {
            continue;
        }

        for hunk in &fd.hunks {
            let added_syms: std::collections::BTreeSet<_> =
                detect_symbols_in_lines(&hunk.added_lines).into_iter().collect();
            let removed_syms: std::collections::BTreeSet<_> =
                detect_symbols_in_lines(&hunk.removed_lines).into_iter().collect();

            for (kind, name) in added_syms.intersection(&removed_syms) {
                modified.push(SymbolChange {
                    kind: *kind,
                    name: name.clone(),
                    change_type: ChangeType::Modified,
                    file_path: fd.path().to_string(),
                });
            }
            for (kind, name) in added_syms.difference(&removed_syms) {
                added.push(SymbolChange {
                    kind: *kind,
                    name: name.clone(),
                    change_type: ChangeType::Added,
                    file_path: fd.path().to_string(),
                });
            }
            for (kind, name) in removed_syms.difference(&added_syms) {
                deleted.push(SymbolChange {
                    kind: *kind,
                    name: name.clone(),
                    change_type: ChangeType::Deleted,
                    file_path: fd.path().to_string(),
                });
            }
        }

        for hunk in &fd.hunks {
            if hunk.header.is_empty() {
                continue;
            }
            for (kind, name) in detect_symbols_in_lines(&[hunk.header.clone()]) {
                let already = added.iter().chain(&modified).chain(&deleted).any(|s| {
                    s.name == name && s.kind == kind && s.file_path == fd.path()
                });
                if !already && (!hunk.added_lines.is_empty() || !hunk.removed_lines.is_empty()) {
                    modified.push(SymbolChange {
                        kind,
                        name,
                        change_type: ChangeType::Modified,
                        file_path: fd.path().to_string(),
                    });
                }
            }
        }
    }

    (added, modified, deleted)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeShape {
    TinyFix,
    SmallFix,
    FeatureAdd,
    FeatureModify,
    Refactor,
    LargeRefactor,
    ConfigChange,
    Documentation,
    Test,
}

impl ChangeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeShape::TinyFix => "tiny_fix",
            ChangeShape::SmallFix => "small_fix",
            ChangeShape::FeatureAdd => "feature_add",
            ChangeShape::FeatureModify => "feature_modify",
            ChangeShape::Refactor => "refactor",
            ChangeShape::LargeRefactor => "large_refactor",
            ChangeShape::ConfigChange => "config_change",
            ChangeShape::Documentation => "documentation",
            ChangeShape::Test => "test",
        }
    }
}

const CONFIG_EXTS: &[&str] = &["json", "yaml", "yml", "toml", "ini", "cfg", "env", "conf"];
const DOC_EXTS: &[&str] = &["md", "rst", "txt", "adoc"];

static TEST_PATH_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["test[_/]", "spec[_/]", r"_test\.", r"\.test\.", r"\.spec\."]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

fn ext_of(path: &str) -> String {
    Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase()
}

/// Classifies a commit's overall change shape from its file diffs and
/// detected symbol changes, following a fixed deterministic priority order
/// (ported from `classify_change_shape`).
pub fn classify_change_shape(
    file_diffs: &[FileDiff],
    symbols_added: &[SymbolChange],
    symbols_modified: &[SymbolChange],
) -> ChangeShape {
    let visible: Vec<&FileDiff> = file_diffs.iter().filter(|fd| !fd.is_binary).collect();
    let total_insertions: usize = visible.iter().map(|fd| fd.insertions()).sum();
    let total_deletions: usize = visible.iter().map(|fd| fd.deletions()).sum();
    let total_changes = total_insertions + total_deletions;
    let paths: Vec<&str> = visible.iter().map(|fd| fd.path()).collect();

    let all_config = !paths.is_empty() && paths.iter().all(|p| CONFIG_EXTS.contains(&ext_of(p).as_str()));
    let all_docs = !paths.is_empty() && paths.iter().all(|p| DOC_EXTS.contains(&ext_of(p).as_str()));
    let all_tests = !paths.is_empty()
        && paths.iter().all(|p| TEST_PATH_RE.iter().any(|re| re.is_match(p)));

    if all_docs {
        return ChangeShape::Documentation;
    }
    if all_tests {
        return ChangeShape::Test;
    }
    if all_config {
        return ChangeShape::ConfigChange;
    }

    let has_new_symbols = !symbols_added.is_empty();

    if total_changes < 10 && !has_new_symbols {
        return ChangeShape::TinyFix;
    }
    if total_changes < 30 && !has_new_symbols {
        return ChangeShape::SmallFix;
    }

    if total_insertions > 0 && total_deletions > 0 {
        let ratio = total_insertions.min(total_deletions) as f64 / total_insertions.max(total_deletions) as f64;
        if ratio > 0.6 && total_changes > 50 {
            return if total_changes > 200 { ChangeShape::LargeRefactor } else { ChangeShape::Refactor };
        }
    }

    if has_new_symbols {
        return ChangeShape::FeatureAdd;
    }
    if !symbols_modified.is_empty() {
        return ChangeShape::FeatureModify;
    }

    if total_changes < 30 {
        ChangeShape::SmallFix
    } else {
        ChangeShape::FeatureModify
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiffStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// Builds the `--- Diff Summary ---` text body (spec §4.4, ~500 tokens /
/// ~2000 chars max, ported from `generate_summary`).
pub fn generate_summary(
    file_diffs: &[FileDiff],
    symbols_added: &[SymbolChange],
    symbols_modified: &[SymbolChange],
    symbols_deleted: &[SymbolChange],
    change_shape: ChangeShape,
    max_tokens: usize,
) -> String {
    let visible: Vec<&FileDiff> = file_diffs.iter().filter(|fd| !fd.is_binary).collect();
    let files_changed = visible.len();
    let total_ins: usize = visible.iter().map(|fd| fd.insertions()).sum();
    let total_del: usize = visible.iter().map(|fd| fd.deletions()).sum();

    let mut parts = vec![format!(
        "Shape: {} ({files_changed} files, +{total_ins} -{total_del})",
        change_shape.as_str()
    )];

    let fmt_syms = |syms: &[SymbolChange]| -> String {
        syms.iter().take(10).map(|s| format!("{}:{}", s.kind.as_str(), s.name)).collect::<Vec<_>>().join(", ")
    };

    if !symbols_added.is_empty() {
        parts.push(format!("Added: {}", fmt_syms(symbols_added)));
    }
    if !symbols_modified.is_empty() {
        parts.push(format!("Modified: {}", fmt_syms(symbols_modified)));
    }
    if !symbols_deleted.is_empty() {
        parts.push(format!("Deleted: {}", fmt_syms(symbols_deleted)));
    }

    let file_paths: Vec<&str> = visible.iter().take(10).map(|fd| fd.path()).collect();
    if !file_paths.is_empty() {
        parts.push(format!("Files: {}", file_paths.join(", ")));
    }

    let mut result = parts.join("\n");
    let max_chars = max_tokens * 4;
    if result.len() > max_chars && max_chars > 3 {
        result.truncate(max_chars - 3);
        result.push_str("...");
    }
    result
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffSummary {
    pub files: Vec<FileDiff>,
    pub symbols_added: Vec<SymbolChange>,
    pub symbols_modified: Vec<SymbolChange>,
    pub symbols_deleted: Vec<SymbolChange>,
    pub change_shape: ChangeShape,
    pub diff_stats: DiffStats,
    pub summary_text: String,
}

/// Full analysis pipeline: parse, classify symbols, classify shape,
/// generate the summary text (spec §4.4, ported from `analyze_diff`).
pub fn analyze_diff(diff_text: &str, config: &IngestConfig) -> DiffSummary {
    let files = parse_unified_diff(diff_text, config.max_diff_lines);
    let (symbols_added, symbols_modified, symbols_deleted) = classify_symbols(&files);
    let change_shape = classify_change_shape(&files, &symbols_added, &symbols_modified);
    let summary_text = generate_summary(
        &files,
        &symbols_added,
        &symbols_modified,
        &symbols_deleted,
        change_shape,
        config.diff_summary_max_tokens,
    );

    let visible: Vec<&FileDiff> = files.iter().filter(|fd| !fd.is_binary).collect();
    let diff_stats = DiffStats {
        files_changed: visible.len(),
        insertions: visible.iter().map(|fd| fd.insertions()).sum(),
        deletions: visible.iter().map(|fd| fd.deletions()).sum(),
    };

    DiffSummary { files, symbols_added, symbols_modified, symbols_deleted, change_shape, diff_stats, summary_text }
}
