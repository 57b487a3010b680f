//! Regex-fallback parsing (spec §4.4 "a regex fallback covers Python,
//! JS/TS, Ruby, Go, Java, Rust, PHP"), ported from `ast_parser.py`'s
//! `_parse_python_regex` / `_parse_js_ts_regex` / `_parse_generic_regex`.
//!
//! Used whenever a language has no tree-sitter grammar wired in, or the
//! tree-sitter parse itself fails (e.g. a file too mangled to parse cleanly
//! still yields useful line-based structure here).

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{ClassInfo, FunctionInfo, InterfaceInfo, ModuleInfo, ParseResult};
use super::patterns::{detect_pattern, estimate_complexity};

fn module_name(file_path: &str) -> String {
    std::path::Path::new(file_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string())
}

fn body_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Finds the line (1-based, exclusive upper bound) where a C-family brace
/// block opened on or after `start` closes.
fn find_brace_end(lines: &[&str], start: usize) -> usize {
    let mut depth = 0i32;
    let mut found_open = false;
    for (offset, line) in lines.iter().enumerate().skip(start).take(2000) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    found_open = true;
                }
                '}' => {
                    depth -= 1;
                    if found_open && depth == 0 {
                        return offset + 1;
                    }
                }
                _ => {}
            }
        }
    }
    (start + 50).min(lines.len())
}

static RUBY_BLOCK_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(def|class|module|do|if|unless|case|begin|while|until|for)\b").unwrap());

/// Finds the matching `end` for Ruby-style blocks.
fn find_ruby_end(lines: &[&str], start: usize) -> usize {
    let mut depth = 0i32;
    for (offset, line) in lines.iter().enumerate().skip(start).take(2000) {
        let stripped = line.trim_start();
        if RUBY_BLOCK_OPEN_RE.is_match(stripped) {
            depth += 1;
        }
        if stripped == "end" || stripped.starts_with("end ") {
            depth -= 1;
            if depth <= 0 {
                return offset + 1;
            }
        }
    }
    (start + 50).min(lines.len())
}

static PY_IMPORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:from\s+(\S+)\s+)?import\s+(.+)").unwrap());
static PY_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)class\s+(\w+)(?:\(([^)]*)\))?:").unwrap());
static PY_FN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)").unwrap());

fn python_docstring(lines: &[&str], def_line: usize) -> String {
    let Some(next_line) = lines.get(def_line + 1) else { return String::new() };
    let trimmed = next_line.trim();
    let quote = if trimmed.starts_with("\"\"\"") {
        "\"\"\""
    } else if trimmed.starts_with("'''") {
        "'''"
    } else {
        return String::new();
    };
    if trimmed.matches(quote).count() >= 2 {
        return trimmed.trim_matches(|c| c == '"' || c == '\'').trim().chars().take(200).collect();
    }
    let mut parts = Vec::new();
    for line in lines.iter().skip(def_line + 1).take(9) {
        let t = line.trim();
        parts.push(t.to_string());
        if t.ends_with(quote) {
            break;
        }
    }
    parts.join(" ").trim_matches(|c| c == '"' || c == '\'').trim().chars().take(200).collect()
}

pub fn parse_python(content: &str, file_path: &str) -> ParseResult {
    let lines: Vec<&str> = content.lines().collect();
    let name = module_name(file_path);
    let hash = body_hash(content);

    let mut imports = Vec::new();
    for line in &lines {
        if let Some(caps) = PY_IMPORT_RE.captures(line) {
            let module = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| caps[2].split(',').next().unwrap_or("").trim().split('.').next().unwrap_or("").to_string());
            imports.push(module);
        }
    }

    let mut classes: Vec<ClassInfo> = Vec::new();
    let mut functions = Vec::new();
    let mut current_class: Option<usize> = None; // index into `classes`
    let mut current_class_indent = 0usize;

    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim_start();
        let indent = line.len() - stripped.len();

        if current_class.is_some() && indent <= current_class_indent && !stripped.is_empty() && !stripped.starts_with('#') {
            current_class = None;
        }

        if let Some(caps) = PY_CLASS_RE.captures(line) {
            let class_indent = caps[1].len();
            let cname = caps[2].to_string();
            let bases: Vec<String> = caps
                .get(3)
                .map(|m| m.as_str().split(',').map(|b| b.trim().to_string()).filter(|b| !b.is_empty()).collect())
                .unwrap_or_default();

            let class_end = (i + 1..lines.len())
                .find(|&j| {
                    let ns = lines[j].trim_start();
                    let ni = lines[j].len() - ns.len();
                    !ns.is_empty() && !ns.starts_with('#') && ni <= class_indent
                })
                .map(|j| j)
                .unwrap_or(lines.len());

            classes.push(ClassInfo {
                name: cname.clone(),
                qualified_name: format!("{name}.{cname}"),
                line_start: i + 1,
                line_end: class_end,
                docstring: python_docstring(&lines, i),
                base_classes: bases,
                detected_pattern: detect_pattern(&cname),
                methods: Vec::new(),
            });
            current_class = Some(classes.len() - 1);
            current_class_indent = class_indent;
            continue;
        }

        if let Some(caps) = PY_FN_RE.captures(line) {
            let fn_indent = caps[1].len();
            let fname = caps[2].to_string();
            let params_str = caps[3].to_string();
            let params: Vec<&str> = params_str
                .split(',')
                .map(|p| p.split(':').next().unwrap_or("").split('=').next().unwrap_or("").trim())
                .filter(|p| !p.is_empty() && *p != "self" && *p != "cls")
                .collect();

            let is_method = current_class.is_some() && fn_indent > current_class_indent;
            let (qualified, method_of) = if is_method {
                let cname = classes[current_class.unwrap()].name.clone();
                classes[current_class.unwrap()].methods.push(fname.clone());
                (format!("{name}.{cname}.{fname}"), Some(cname))
            } else {
                (format!("{name}.{fname}"), None)
            };

            let fn_end = (i + 1..lines.len())
                .find(|&j| {
                    let ns = lines[j].trim_start();
                    let ni = lines[j].len() - ns.len();
                    !ns.is_empty() && !ns.starts_with('#') && ni <= fn_indent
                })
                .unwrap_or(lines.len());

            let body_lines = &lines[(i + 1).min(lines.len())..fn_end];
            let sig = if line.contains("async def") {
                format!("async def {fname}({})", params_str.trim())
            } else {
                format!("def {fname}({})", params_str.trim())
            };

            functions.push(FunctionInfo {
                name: fname,
                qualified_name: qualified,
                signature: sig.chars().take(200).collect(),
                line_start: i + 1,
                line_end: fn_end,
                docstring: python_docstring(&lines, i),
                is_method,
                method_of,
                param_count: params.len(),
                complexity_hint: estimate_complexity(body_lines),
            });
        }
    }

    ParseResult {
        module: Some(ModuleInfo {
            file_path: file_path.to_string(),
            language: "python",
            line_count: lines.len(),
            import_count: imports.len(),
            symbol_count: classes.len() + functions.len(),
            body_hash: hash,
            imports,
        }),
        classes,
        functions,
        interfaces: Vec::new(),
    }
}

static JS_IMPORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^import\s+.*?from\s+['"]([^'"]+)['"]"#).unwrap());
static JS_REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:const|let|var)\s+\w+\s*=\s*require\(['"]([^'"]+)['"]\)"#).unwrap());
static JS_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)(?:\s+extends\s+(\w+))?").unwrap()
});
static TS_INTERFACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:export\s+)?interface\s+(\w+)").unwrap());
static TS_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:export\s+)?type\s+(\w+)\s*=").unwrap());
static JS_FN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)").unwrap());
static JS_ARROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:\([^)]*\)|[^=])\s*=>").unwrap()
});

pub fn parse_js_ts(content: &str, file_path: &str, language: &'static str) -> ParseResult {
    let lines: Vec<&str> = content.lines().collect();
    let name = module_name(file_path);
    let hash = body_hash(content);

    let mut imports = Vec::new();
    for line in &lines {
        if let Some(caps) = JS_IMPORT_RE.captures(line) {
            imports.push(caps[1].to_string());
        } else if let Some(caps) = JS_REQUIRE_RE.captures(line) {
            imports.push(caps[1].to_string());
        }
    }

    let mut classes = Vec::new();
    let mut functions = Vec::new();
    let mut interfaces = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim_start();

        if let Some(caps) = JS_CLASS_RE.captures(stripped) {
            let cname = caps[1].to_string();
            let bases = caps.get(2).map(|m| vec![m.as_str().to_string()]).unwrap_or_default();
            let end = find_brace_end(&lines, i);
            classes.push(ClassInfo {
                name: cname.clone(),
                qualified_name: format!("{name}.{cname}"),
                line_start: i + 1,
                line_end: end,
                docstring: String::new(),
                base_classes: bases,
                detected_pattern: detect_pattern(&cname),
                methods: Vec::new(),
            });
            continue;
        }

        if language == "typescript" {
            if let Some(caps) = TS_INTERFACE_RE.captures(stripped) {
                let iname = caps[1].to_string();
                let end = find_brace_end(&lines, i);
                interfaces.push(InterfaceInfo {
                    name: iname.clone(),
                    qualified_name: format!("{name}.{iname}"),
                    line_start: i + 1,
                    line_end: end,
                    method_signatures: Vec::new(),
                });
                continue;
            }
            if let Some(caps) = TS_TYPE_RE.captures(stripped) {
                let iname = caps[1].to_string();
                interfaces.push(InterfaceInfo {
                    name: iname.clone(),
                    qualified_name: format!("{name}.{iname}"),
                    line_start: i + 1,
                    line_end: i + 1,
                    method_signatures: Vec::new(),
                });
                continue;
            }
        }

        if let Some(caps) = JS_FN_RE.captures(stripped) {
            let fname = caps[1].to_string();
            let params_str = caps[2].to_string();
            let params: Vec<&str> = params_str
                .split(',')
                .map(|p| p.split(':').next().unwrap_or("").split('=').next().unwrap_or("").trim())
                .filter(|p| !p.is_empty())
                .collect();
            let end = find_brace_end(&lines, i);
            let body_lines = &lines[(i + 1).min(lines.len())..end];
            functions.push(FunctionInfo {
                name: fname.clone(),
                qualified_name: format!("{name}.{fname}"),
                signature: format!("function {fname}({})", params_str.trim().chars().take(100).collect::<String>()),
                line_start: i + 1,
                line_end: end,
                docstring: String::new(),
                is_method: false,
                method_of: None,
                param_count: params.len(),
                complexity_hint: estimate_complexity(body_lines),
            });
            continue;
        }

        if let Some(caps) = JS_ARROW_RE.captures(stripped) {
            let fname = caps[1].to_string();
            let end = if line.contains('{') { find_brace_end(&lines, i) } else { i + 1 };
            functions.push(FunctionInfo {
                name: fname.clone(),
                qualified_name: format!("{name}.{fname}"),
                signature: format!("const {fname} = (...) =>"),
                line_start: i + 1,
                line_end: end,
                docstring: String::new(),
                is_method: false,
                method_of: None,
                param_count: 0,
                complexity_hint: "simple",
            });
        }
    }

    ParseResult {
        module: Some(ModuleInfo {
            file_path: file_path.to_string(),
            language,
            line_count: lines.len(),
            import_count: imports.len(),
            symbol_count: classes.len() + functions.len() + interfaces.len(),
            body_hash: hash,
            imports,
        }),
        classes,
        functions,
        interfaces,
    }
}

struct GenericPatterns {
    import_re: Option<Regex>,
    func_re: Option<Regex>,
    struct_re: Option<Regex>,
    iface_re: Option<Regex>,
}

fn generic_patterns(language: &str) -> GenericPatterns {
    match language {
        "go" => GenericPatterns {
            import_re: Some(Regex::new(r#"^\s*"([^"]+)""#).unwrap()),
            func_re: Some(Regex::new(r"^func\s+(?:\(\w+\s+\*?(\w+)\)\s+)?(\w+)\s*\(([^)]*)\)").unwrap()),
            struct_re: Some(Regex::new(r"^type\s+(\w+)\s+struct\b").unwrap()),
            iface_re: Some(Regex::new(r"^type\s+(\w+)\s+interface\b").unwrap()),
        },
        "ruby" => GenericPatterns {
            import_re: Some(Regex::new(r#"^require\s+['"]([^'"]+)['"]"#).unwrap()),
            func_re: Some(Regex::new(r"^\s*def\s+(\w+[?!]?)\s*(?:\(([^)]*)\))?").unwrap()),
            struct_re: Some(Regex::new(r"^\s*(?:class|module)\s+(\w+)(?:\s*<\s*(\w+))?").unwrap()),
            iface_re: None,
        },
        "java" => GenericPatterns {
            import_re: Some(Regex::new(r"^import\s+(?:static\s+)?([^;]+);").unwrap()),
            func_re: Some(Regex::new(r"^\s*(?:public|private|protected|static|final|abstract|\s)*\s+\w+\s+(\w+)\s*\(([^)]*)\)").unwrap()),
            struct_re: Some(
                Regex::new(r"^\s*(?:public|private|protected|abstract|final|\s)*\s*class\s+(\w+)(?:\s+extends\s+(\w+))?").unwrap(),
            ),
            iface_re: Some(Regex::new(r"^\s*(?:public\s+)?interface\s+(\w+)").unwrap()),
        },
        "rust" => GenericPatterns {
            import_re: Some(Regex::new(r"^use\s+([^;]+);").unwrap()),
            func_re: Some(Regex::new(r"^\s*(?:pub\s+)?(?:async\s+)?fn\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)").unwrap()),
            struct_re: Some(Regex::new(r"^\s*(?:pub\s+)?(?:struct|enum)\s+(\w+)").unwrap()),
            iface_re: Some(Regex::new(r"^\s*(?:pub\s+)?trait\s+(\w+)").unwrap()),
        },
        "php" => GenericPatterns {
            import_re: Some(Regex::new(r"^use\s+([^;]+);").unwrap()),
            func_re: Some(Regex::new(r"^\s*(?:public|private|protected|static|\s)*\s*function\s+(\w+)\s*\(([^)]*)\)").unwrap()),
            struct_re: Some(Regex::new(r"^\s*(?:abstract\s+)?class\s+(\w+)(?:\s+extends\s+(\w+))?").unwrap()),
            iface_re: Some(Regex::new(r"^\s*interface\s+(\w+)").unwrap()),
        },
        _ => GenericPatterns { import_re: None, func_re: None, struct_re: None, iface_re: None },
    }
}

/// Regex fallback for Go, Ruby, Java, Rust, PHP (ported from
/// `_parse_generic_regex`).
pub fn parse_generic(content: &str, file_path: &str, language: &'static str) -> ParseResult {
    let lines: Vec<&str> = content.lines().collect();
    let name = module_name(file_path);
    let hash = body_hash(content);
    let pats = generic_patterns(language);

    let mut imports = Vec::new();
    let mut classes: Vec<ClassInfo> = Vec::new();
    let mut functions = Vec::new();
    let mut interfaces = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim_start();

        if let Some(re) = &pats.import_re {
            if let Some(caps) = re.captures(stripped) {
                imports.push(caps[1].trim().to_string());
                continue;
            }
        }

        if let Some(re) = &pats.struct_re {
            if let Some(caps) = re.captures(stripped) {
                let cname = caps[1].to_string();
                let bases = caps.get(2).map(|m| vec![m.as_str().to_string()]).unwrap_or_default();
                let end = if language == "ruby" { find_ruby_end(&lines, i) } else { find_brace_end(&lines, i) };
                classes.push(ClassInfo {
                    name: cname.clone(),
                    qualified_name: format!("{name}.{cname}"),
                    line_start: i + 1,
                    line_end: end,
                    docstring: String::new(),
                    base_classes: bases,
                    detected_pattern: detect_pattern(&cname),
                    methods: Vec::new(),
                });
                continue;
            }
        }

        if let Some(re) = &pats.iface_re {
            if let Some(caps) = re.captures(stripped) {
                let iname = caps[1].to_string();
                let end = if language == "ruby" { i + 1 } else { find_brace_end(&lines, i) };
                interfaces.push(InterfaceInfo {
                    name: iname.clone(),
                    qualified_name: format!("{name}.{iname}"),
                    line_start: i + 1,
                    line_end: end,
                    method_signatures: Vec::new(),
                });
                continue;
            }
        }

        if let Some(re) = &pats.func_re {
            if let Some(caps) = re.captures(stripped) {
                let (fname, params_str, is_method, method_of) = if language == "go" {
                    let receiver = caps.get(1).map(|m| m.as_str().to_string());
                    let n = caps[2].to_string();
                    let p = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
                    let is_m = receiver.is_some();
                    (n, p, is_m, receiver)
                } else {
                    let n = caps[1].to_string();
                    let p = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
                    (n, p, false, None)
                };

                let params: Vec<&str> = params_str
                    .split(',')
                    .map(|p| p.split(':').next().unwrap_or("").split('=').next().unwrap_or("").trim())
                    .filter(|p| !p.is_empty())
                    .collect();
                let end = if language == "ruby" { find_ruby_end(&lines, i) } else { find_brace_end(&lines, i) };
                let qualified = match &method_of {
                    Some(recv) => format!("{name}.{recv}.{fname}"),
                    None => format!("{name}.{fname}"),
                };

                functions.push(FunctionInfo {
                    name: fname,
                    qualified_name: qualified,
                    signature: stripped.chars().take(200).collect(),
                    line_start: i + 1,
                    line_end: end,
                    docstring: String::new(),
                    is_method,
                    method_of,
                    param_count: params.len(),
                    complexity_hint: "simple",
                });
            }
        }
    }

    ParseResult {
        module: Some(ModuleInfo {
            file_path: file_path.to_string(),
            language,
            line_count: lines.len(),
            import_count: imports.len(),
            symbol_count: classes.len() + functions.len() + interfaces.len(),
            body_hash: hash,
            imports,
        }),
        classes,
        functions,
        interfaces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_python_classes_and_methods() {
        let src = "class UserService:\n    \"\"\"Handles users.\"\"\"\n    def get(self, id):\n        if id:\n            return id\n        return None\n";
        let result = parse_python(src, "user_service.py");
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].detected_pattern, "Service");
        assert_eq!(result.functions.len(), 1);
        assert!(result.functions[0].is_method);
        assert_eq!(result.functions[0].method_of.as_deref(), Some("UserService"));
    }

    #[test]
    fn parses_typescript_interfaces_and_arrow_functions() {
        let src = "export interface Widget {\n  id: string\n}\n\nexport const build = (x) => {\n  return x\n}\n";
        let result = parse_js_ts(src, "widget.ts", "typescript");
        assert_eq!(result.interfaces.len(), 1);
        assert_eq!(result.interfaces[0].name, "Widget");
        assert_eq!(result.functions.len(), 1);
        assert_eq!(result.functions[0].name, "build");
    }

    #[test]
    fn parses_go_structs_and_methods() {
        let src = "package main\n\ntype UserRepository struct {\n\tdb *sql.DB\n}\n\nfunc (r *UserRepository) Find(id string) error {\n\treturn nil\n}\n";
        let result = parse_generic(src, "repo.go", "go");
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].detected_pattern, "Repository");
        assert_eq!(result.functions.len(), 1);
        assert!(result.functions[0].is_method);
    }

    #[test]
    fn parses_rust_traits_and_fns() {
        let src = "pub trait EmbeddingProvider {\n    fn embed(&self, text: &str) -> Vec<f32>;\n}\n\npub fn helper(x: i32) -> i32 {\n    x + 1\n}\n";
        let result = parse_generic(src, "lib.rs", "rust");
        assert_eq!(result.interfaces.len(), 1);
        assert_eq!(result.interfaces[0].name, "EmbeddingProvider");
        assert!(result.functions.iter().any(|f| f.name == "helper"));
    }
}
