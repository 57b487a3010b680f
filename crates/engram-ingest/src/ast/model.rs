//! Parse-result types shared by the tree-sitter and regex backends
//! (ported from `original_source/.claude/brain/ast_parser.py`'s
//! `ModuleInfo`/`ClassInfo`/`FunctionInfo`/`InterfaceInfo` dataclasses).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub file_path: String,
    pub language: &'static str,
    pub line_count: usize,
    pub import_count: usize,
    pub symbol_count: usize,
    pub body_hash: String,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub qualified_name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub docstring: String,
    pub base_classes: Vec<String>,
    pub detected_pattern: String,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub qualified_name: String,
    pub signature: String,
    pub line_start: usize,
    pub line_end: usize,
    pub docstring: String,
    pub is_method: bool,
    pub method_of: Option<String>,
    pub param_count: usize,
    pub complexity_hint: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub qualified_name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub method_signatures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    pub module: Option<ModuleInfo>,
    pub classes: Vec<ClassInfo>,
    pub functions: Vec<FunctionInfo>,
    pub interfaces: Vec<InterfaceInfo>,
}
