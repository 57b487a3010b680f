//! Multi-language AST ingestion (spec §4.4 "AST ingestion"), ported from
//! `original_source/.claude/brain/ast_parser.py`. Recursively walks a
//! source tree, parses each recognized file with a tree-sitter backend when
//! one is wired in (today: Python, Rust) and a regex fallback otherwise,
//! and folds the result into `Module`/`Class`/`Function`/`Interface` nodes
//! plus `DEFINES`/`INHERITS`/`MEMBER_OF`/`IMPORTS` edges.

mod model;
mod patterns;
mod regex_backend;
mod tree_sitter_backend;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde_json::{Map, Value};

use engram_core::config::IngestConfig;
use engram_core::errors::EngramResult;
use engram_core::{code_node_id, MemoryState, Node};
use engram_graph::Graph;

pub use model::{ClassInfo, FunctionInfo, InterfaceInfo, ModuleInfo, ParseResult};
pub use patterns::{detect_pattern, estimate_complexity};

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
    ".git",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "coverage",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "target",
    ".gradle",
    "bin",
    "obj",
    ".idea",
    ".vscode",
    ".claude",
];

/// Maps a file extension to its language name (spec §4.4 "Python, JS/TS,
/// Ruby, Go, Java, Rust, PHP").
pub fn detect_language(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str())? {
        "py" => Some("python"),
        "js" | "jsx" => Some("javascript"),
        "ts" | "tsx" => Some("typescript"),
        "rb" => Some("ruby"),
        "go" => Some("go"),
        "java" => Some("java"),
        "rs" => Some("rust"),
        "php" => Some("php"),
        _ => None,
    }
}

/// True if any path component is a skip-listed build/vendor/dot directory.
pub fn should_skip_path(path: &Path) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        SKIP_DIRS.contains(&s.as_ref()) || (s.starts_with('.') && s != "." && s != "..")
    })
}

/// Parses a single file's `content`, preferring the tree-sitter backend and
/// falling back to the per-language regex parser.
pub fn parse_file(content: &str, file_path: &str) -> Option<ParseResult> {
    let language = detect_language(Path::new(file_path))?;

    if let Some(result) = tree_sitter_backend::parse(content, file_path, language) {
        return Some(result);
    }

    Some(match language {
        "python" => regex_backend::parse_python(content, file_path),
        "javascript" => regex_backend::parse_js_ts(content, file_path, "javascript"),
        "typescript" => regex_backend::parse_js_ts(content, file_path, "typescript"),
        other => regex_backend::parse_generic(content, file_path, other),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AstIngestStats {
    pub files_parsed: usize,
    pub files_skipped_unchanged: usize,
    pub files_skipped_unsupported: usize,
    pub modules: usize,
    pub classes: usize,
    pub functions: usize,
    pub interfaces: usize,
}

/// Recursively walks `root` honoring the skip-list and `config`'s max file
/// size, parsing and ingesting every recognized source file.
///
/// `languages`, if non-empty, restricts the scan to that language set
/// (spec §4.4's `--lang py,ts`-equivalent filter).
pub fn scan_and_ingest(
    graph: &Graph,
    root: &Path,
    config: &IngestConfig,
    languages: &[&str],
) -> EngramResult<AstIngestStats> {
    let mut stats = AstIngestStats::default();
    let mut module_ids_by_name: HashMap<String, String> = HashMap::new();
    let mut files: Vec<std::path::PathBuf> = Vec::new();

    let walker = ignore::WalkBuilder::new(root).hidden(false).build();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(path);
        if should_skip_path(rel) {
            continue;
        }
        let Some(language) = detect_language(path) else {
            continue;
        };
        if !languages.is_empty() && !languages.contains(&language) {
            stats.files_skipped_unsupported += 1;
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();

    // First pass: parse every file, so the import-resolution pass below can
    // see every module regardless of walk order.
    let mut parsed: Vec<(String, ParseResult)> = Vec::new();

    for path in &files {
        let Ok(metadata) = std::fs::metadata(path) else { continue };
        if metadata.len() == 0 || metadata.len() > config.max_file_size_bytes {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else { continue };
        let rel_path = path.strip_prefix(root).unwrap_or(path).to_string_lossy().to_string();

        let module_label_id = code_node_id(&rel_path, &module_qualified_name(&rel_path), "Module");
        if let Some(existing) = graph.get_node(&module_label_id)? {
            if existing.properties.get("body_hash").and_then(Value::as_str) == Some(&body_hash(&content)) {
                stats.files_skipped_unchanged += 1;
                continue;
            }
        }

        let Some(result) = parse_file(&content, &rel_path) else {
            stats.files_skipped_unsupported += 1;
            continue;
        };
        stats.files_parsed += 1;
        parsed.push((rel_path, result));
    }

    for (rel_path, result) in &parsed {
        if result.module.is_some() {
            let module_name = module_qualified_name(rel_path);
            module_ids_by_name.insert(module_name, code_node_id(rel_path, &module_qualified_name(rel_path), "Module"));
        }
    }

    for (rel_path, result) in &parsed {
        let counts = ingest_parse_result(graph, rel_path, result, &module_ids_by_name)?;
        stats.modules += 1;
        stats.classes += counts.0;
        stats.functions += counts.1;
        stats.interfaces += counts.2;
    }

    Ok(stats)
}

fn module_qualified_name(rel_path: &str) -> String {
    Path::new(rel_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| rel_path.to_string())
}

fn body_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

fn code_node(id: String, labels: &[&str], title: &str, content: &str, extra: Map<String, Value>) -> Node {
    let mut properties = extra;
    properties.insert("title".to_string(), Value::from(title));
    properties.insert("content".to_string(), Value::from(content));
    properties.insert("summary".to_string(), Value::from(engram_core::derive_summary(content)));

    let mut labels_set: BTreeSet<String> = BTreeSet::new();
    labels_set.insert("Code".to_string());
    for l in labels {
        labels_set.insert(l.to_string());
    }

    Node {
        id,
        labels: labels_set,
        properties,
        memory: MemoryState::new(chrono::Utc::now(), engram_core::decay_rate_for_labels(&labels_set)),
    }
}

/// Ingests one file's parse result: a `Module` node, its `Class`/`Function`/
/// `Interface` children, and the structural edges between them. Returns
/// `(classes, functions, interfaces)` counts.
fn ingest_parse_result(
    graph: &Graph,
    rel_path: &str,
    result: &ParseResult,
    module_ids_by_name: &HashMap<String, String>,
) -> EngramResult<(usize, usize, usize)> {
    let Some(module) = &result.module else {
        return Ok((0, 0, 0));
    };

    let module_name = module_qualified_name(rel_path);
    let module_id = code_node_id(rel_path, &module_name, "Module");

    let mut module_props = Map::new();
    module_props.insert("body_hash".to_string(), Value::from(module.body_hash.clone()));
    module_props.insert("language".to_string(), Value::from(module.language));
    module_props.insert("file_path".to_string(), Value::from(rel_path));
    module_props.insert("line_count".to_string(), Value::from(module.line_count));
    module_props.insert("import_count".to_string(), Value::from(module.import_count));
    module_props.insert("symbol_count".to_string(), Value::from(module.symbol_count));

    graph.add_node_raw(code_node(
        module_id.clone(),
        &["Module"],
        &module_name,
        &module_content_text(module),
        module_props,
    ))?;

    let mut class_ids: HashMap<String, String> = HashMap::new();

    for class in &result.classes {
        let class_id = code_node_id(rel_path, &class.qualified_name, "Class");
        class_ids.insert(class.name.clone(), class_id.clone());

        let mut props = Map::new();
        props.insert("qualified_name".to_string(), Value::from(class.qualified_name.clone()));
        props.insert("file_path".to_string(), Value::from(rel_path));
        props.insert("line_start".to_string(), Value::from(class.line_start));
        props.insert("line_end".to_string(), Value::from(class.line_end));
        if !class.detected_pattern.is_empty() {
            props.insert("detected_pattern".to_string(), Value::from(class.detected_pattern.clone()));
        }
        props.insert(
            "base_classes".to_string(),
            Value::from(class.base_classes.clone()),
        );

        let mut labels = vec!["Class"];
        if !class.detected_pattern.is_empty() {
            labels.push(class.detected_pattern.as_str());
        }

        graph.add_node_raw(code_node(class_id.clone(), &labels, &class.name, &class_content_text(class), props))?;

        graph.add_edge(engram_core::Edge::new(
            module_id.clone(),
            class_id.clone(),
            engram_core::EdgeType::Defines,
            engram_core::EdgeType::Defines.default_weight(),
        ))?;
    }

    // INHERITS: resolve base classes within the same file only — cross-file
    // resolution would need full import-graph type inference, which none of
    // the backends here attempt.
    for class in &result.classes {
        let Some(class_id) = class_ids.get(&class.name) else { continue };
        for base in &class.base_classes {
            if let Some(base_id) = class_ids.get(base) {
                graph.add_edge(engram_core::Edge::new(
                    class_id.clone(),
                    base_id.clone(),
                    engram_core::EdgeType::Inherits,
                    engram_core::EdgeType::Inherits.default_weight(),
                ))?;
            }
        }
    }

    for function in &result.functions {
        let fn_id = code_node_id(rel_path, &function.qualified_name, "Function");

        let mut props = Map::new();
        props.insert("qualified_name".to_string(), Value::from(function.qualified_name.clone()));
        props.insert("file_path".to_string(), Value::from(rel_path));
        props.insert("signature".to_string(), Value::from(function.signature.clone()));
        props.insert("line_start".to_string(), Value::from(function.line_start));
        props.insert("line_end".to_string(), Value::from(function.line_end));
        props.insert("complexity".to_string(), Value::from(function.complexity_hint));
        props.insert("param_count".to_string(), Value::from(function.param_count));
        props.insert("is_method".to_string(), Value::from(function.is_method));

        graph.add_node_raw(code_node(fn_id.clone(), &["Function"], &function.name, &function_content_text(function), props))?;

        graph.add_edge(engram_core::Edge::new(
            module_id.clone(),
            fn_id.clone(),
            engram_core::EdgeType::Defines,
            engram_core::EdgeType::Defines.default_weight(),
        ))?;

        if let Some(owner) = &function.method_of {
            if let Some(class_id) = class_ids.get(owner) {
                graph.add_edge(engram_core::Edge::new(
                    fn_id.clone(),
                    class_id.clone(),
                    engram_core::EdgeType::MemberOf,
                    engram_core::EdgeType::MemberOf.default_weight(),
                ))?;
            }
        }
    }

    for iface in &result.interfaces {
        let iface_id = code_node_id(rel_path, &iface.qualified_name, "Interface");

        let mut props = Map::new();
        props.insert("qualified_name".to_string(), Value::from(iface.qualified_name.clone()));
        props.insert("file_path".to_string(), Value::from(rel_path));
        props.insert("line_start".to_string(), Value::from(iface.line_start));
        props.insert("line_end".to_string(), Value::from(iface.line_end));

        graph.add_node_raw(code_node(iface_id.clone(), &["Interface"], &iface.name, &interface_content_text(iface), props))?;

        graph.add_edge(engram_core::Edge::new(
            module_id.clone(),
            iface_id.clone(),
            engram_core::EdgeType::Defines,
            engram_core::EdgeType::Defines.default_weight(),
        ))?;
    }

    for import in &module.imports {
        if let Some(target_id) = module_ids_by_name.get(import) {
            if target_id != &module_id {
                graph.add_edge(engram_core::Edge::new(
                    module_id.clone(),
                    target_id.clone(),
                    engram_core::EdgeType::Imports,
                    engram_core::EdgeType::Imports.default_weight(),
                ))?;
            }
        }
    }

    Ok((result.classes.len(), result.functions.len(), result.interfaces.len()))
}

/// Compact content text for embedding, ~200-500 tokens (spec §4.4,
/// `generate_content_text` in the original).
fn module_content_text(module: &ModuleInfo) -> String {
    let mut parts = vec![format!("module {}", module.file_path)];
    parts.push(format!(
        "  File: {} ({} lines, {})",
        module.file_path, module.line_count, module.language
    ));
    parts.push(format!("  Symbols: {}, Imports: {}", module.symbol_count, module.import_count));
    if !module.imports.is_empty() {
        parts.push(format!("  Imports: {}", module.imports.iter().take(10).cloned().collect::<Vec<_>>().join(", ")));
    }
    parts.join("\n")
}

fn class_content_text(class: &ClassInfo) -> String {
    let span = class.line_end.saturating_sub(class.line_start);
    let mut parts = vec![format!("class {}", class.name)];
    parts.push(format!("  File: {}-{} ({} lines)", class.line_start, class.line_end, span));
    if !class.docstring.is_empty() {
        parts.push(format!("  Docstring: {}", class.docstring));
    }
    if !class.base_classes.is_empty() {
        parts.push(format!("  Inherits: {}", class.base_classes.join(", ")));
    }
    if !class.detected_pattern.is_empty() {
        parts.push(format!("  Pattern: {}", class.detected_pattern));
    }
    if !class.methods.is_empty() {
        parts.push(format!("  Methods: {}", class.methods.iter().take(10).cloned().collect::<Vec<_>>().join(", ")));
    }
    parts.join("\n")
}

fn function_content_text(function: &FunctionInfo) -> String {
    let span = function.line_end.saturating_sub(function.line_start);
    let mut parts = vec![function.signature.clone()];
    parts.push(format!("  File: {}-{} ({} lines)", function.line_start, function.line_end, span));
    if !function.docstring.is_empty() {
        parts.push(format!("  Docstring: {}", function.docstring));
    }
    parts.push(format!("  Complexity: {}", function.complexity_hint));
    if let Some(owner) = &function.method_of {
        parts.push(format!("  Method of: {owner}"));
    }
    parts.join("\n")
}

fn interface_content_text(iface: &InterfaceInfo) -> String {
    let mut parts = vec![format!("interface {}", iface.name)];
    parts.push(format!("  File: {}-{}", iface.line_start, iface.line_end));
    if !iface.method_signatures.is_empty() {
        parts.push(format!("  Methods: {}", iface.method_signatures.iter().take(10).cloned().collect::<Vec<_>>().join(", ")));
    }
    parts.join("\n")
}
