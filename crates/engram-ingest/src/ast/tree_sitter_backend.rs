//! Tree-sitter backed parsing for the languages we carry grammars for
//! (spec §4.4 "a modern tree-sitter backend is preferred when present").
//!
//! Only Python and Rust have a wired-in grammar today (`tree-sitter-python`,
//! `tree-sitter-rust`); every other detected language falls back to
//! [`super::regex_backend`]. Adding a grammar for another language is a
//! matter of depending on its `tree-sitter-<lang>` crate and adding a case
//! to [`parse`] — the walk itself is language-agnostic besides node-type
//! names.

use tree_sitter::{Node as TsNode, Parser};

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

fn node_text<'a>(content: &'a str, node: TsNode) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}

/// Attempts a tree-sitter parse for `language`; `None` means "no grammar
/// wired in, use the regex fallback" rather than a parse error.
pub fn parse(content: &str, file_path: &str, language: &'static str) -> Option<ParseResult> {
    let ts_language = match language {
        "python" => tree_sitter_python::LANGUAGE.into(),
        "rust" => tree_sitter_rust::LANGUAGE.into(),
        _ => return None,
    };

    let mut parser = Parser::new();
    parser.set_language(&ts_language).ok()?;
    let tree = parser.parse(content, None)?;
    let root = tree.root_node();

    let mut walker = Walker {
        content,
        file_path,
        language,
        module: module_name(file_path),
        classes: Vec::new(),
        functions: Vec::new(),
        interfaces: Vec::new(),
        imports: Vec::new(),
    };
    walker.walk(root, None);

    let classes = walker.classes;
    let functions = walker.functions;
    let interfaces = walker.interfaces;
    let imports = walker.imports;

    Some(ParseResult {
        module: Some(ModuleInfo {
            file_path: file_path.to_string(),
            language,
            line_count: content.lines().count(),
            import_count: imports.len(),
            symbol_count: classes.len() + functions.len() + interfaces.len(),
            body_hash: body_hash(content),
            imports,
        }),
        classes,
        functions,
        interfaces,
    })
}

struct Walker<'a> {
    content: &'a str,
    file_path: &'a str,
    language: &'static str,
    module: String,
    classes: Vec<ClassInfo>,
    functions: Vec<FunctionInfo>,
    interfaces: Vec<InterfaceInfo>,
    imports: Vec<String>,
}

impl<'a> Walker<'a> {
    fn docstring(&self, node: TsNode) -> String {
        // Python: class/function `block` child's first `expression_statement > string`.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "block" {
                let mut inner = child.walk();
                for sub in child.children(&mut inner) {
                    if sub.kind() == "expression_statement" {
                        let mut subsub = sub.walk();
                        for s in sub.children(&mut subsub) {
                            if s.kind() == "string" {
                                return node_text(self.content, s)
                                    .trim_matches(|c| c == '"' || c == '\'')
                                    .trim()
                                    .chars()
                                    .take(200)
                                    .collect();
                            }
                        }
                    }
                    break;
                }
                break;
            }
        }
        String::new()
    }

    fn walk(&mut self, node: TsNode<'a>, class_name: Option<String>) {
        match (self.language, node.kind()) {
            ("python", "import_statement") | ("python", "import_from_statement") => {
                let text = node_text(self.content, node);
                if let Some(last) = text.split_whitespace().last() {
                    self.imports.push(last.split('.').next().unwrap_or(last).to_string());
                }
            }
            ("python", "class_definition") => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_default();
                let mut bases = Vec::new();
                if let Some(args) = node.child_by_field_name("superclasses") {
                    let mut cursor = args.walk();
                    for child in args.children(&mut cursor) {
                        if matches!(child.kind(), "identifier" | "attribute") {
                            bases.push(node_text(self.content, child).to_string());
                        }
                    }
                }
                self.classes.push(ClassInfo {
                    name: name.clone(),
                    qualified_name: format!("{}.{}", self.module, name),
                    line_start: node.start_position().row + 1,
                    line_end: node.end_position().row + 1,
                    docstring: self.docstring(node),
                    base_classes: bases,
                    detected_pattern: detect_pattern(&name),
                    methods: Vec::new(),
                });
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, Some(name.clone()));
                }
                return;
            }
            ("python", "function_definition") => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_default();
                let params_str = node
                    .child_by_field_name("parameters")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_else(|| "()".to_string());
                let params: Vec<&str> = params_str
                    .trim_matches(|c| c == '(' || c == ')')
                    .split(',')
                    .map(|p| p.split(':').next().unwrap_or("").split('=').next().unwrap_or("").trim())
                    .filter(|p| !p.is_empty() && *p != "self" && *p != "cls")
                    .collect();

                let is_method = class_name.is_some();
                let qualified = match &class_name {
                    Some(c) => format!("{}.{}.{}", self.module, c, name),
                    None => format!("{}.{}", self.module, name),
                };
                if let Some(c) = &class_name {
                    if let Some(cls) = self.classes.iter_mut().rev().find(|cls| &cls.name == c) {
                        cls.methods.push(name.clone());
                    }
                }

                let body_text = node_text(self.content, node);
                let body_lines: Vec<&str> = body_text.lines().collect();

                self.functions.push(FunctionInfo {
                    name: name.clone(),
                    qualified_name: qualified,
                    signature: format!("def {name}{params_str}").chars().take(200).collect(),
                    line_start: node.start_position().row + 1,
                    line_end: node.end_position().row + 1,
                    docstring: self.docstring(node),
                    is_method,
                    method_of: class_name.clone(),
                    param_count: params.len(),
                    complexity_hint: estimate_complexity(&body_lines),
                });
                return; // don't recurse into function bodies
            }
            ("rust", "use_declaration") => {
                let text = node_text(self.content, node);
                if let Some(path) = text.trim_start_matches("use").trim().strip_suffix(';') {
                    self.imports.push(path.split("::").next().unwrap_or(path).trim().to_string());
                }
            }
            ("rust", "struct_item") | ("rust", "enum_item") => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_default();
                self.classes.push(ClassInfo {
                    name: name.clone(),
                    qualified_name: format!("{}.{}", self.module, name),
                    line_start: node.start_position().row + 1,
                    line_end: node.end_position().row + 1,
                    docstring: String::new(),
                    base_classes: Vec::new(),
                    detected_pattern: detect_pattern(&name),
                    methods: Vec::new(),
                });
            }
            ("rust", "trait_item") => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_default();
                self.interfaces.push(InterfaceInfo {
                    name: name.clone(),
                    qualified_name: format!("{}.{}", self.module, name),
                    line_start: node.start_position().row + 1,
                    line_end: node.end_position().row + 1,
                    method_signatures: Vec::new(),
                });
            }
            ("rust", "impl_item") => {
                let target = node.child_by_field_name("type").map(|n| node_text(self.content, n).to_string());
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, target.clone());
                }
                return;
            }
            ("rust", "function_item") => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_default();
                let params_str = node
                    .child_by_field_name("parameters")
                    .map(|n| node_text(self.content, n).to_string())
                    .unwrap_or_else(|| "()".to_string());
                let is_method = class_name.is_some();
                let qualified = match &class_name {
                    Some(c) => format!("{}.{}.{}", self.module, c, name),
                    None => format!("{}.{}", self.module, name),
                };
                if let Some(c) = &class_name {
                    if let Some(cls) = self.classes.iter_mut().rev().find(|cls| &cls.name == c) {
                        cls.methods.push(name.clone());
                    }
                }
                let body_text = node_text(self.content, node);
                let body_lines: Vec<&str> = body_text.lines().collect();

                self.functions.push(FunctionInfo {
                    name: name.clone(),
                    qualified_name: qualified,
                    signature: format!("fn {name}{params_str}").chars().take(200).collect(),
                    line_start: node.start_position().row + 1,
                    line_end: node.end_position().row + 1,
                    docstring: String::new(),
                    is_method,
                    method_of: class_name.clone(),
                    param_count: 0,
                    complexity_hint: estimate_complexity(&body_lines),
                });
                return;
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, class_name.clone());
        }
    }
}
