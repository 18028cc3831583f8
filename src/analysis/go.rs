//! Go declaration extractor using tree-sitter.
//!
//! Extracts every top-level declaration of a compilation unit:
//! - Constants and variables, one symbol per named binding
//! - Types, one symbol per spec (including aliases)
//! - Functions and methods (with receiver type)
//!
//! Each symbol's range covers its own spec, not the enclosing group, so
//! `const ( A = 1; B = 2 )` yields two independent one-line ranges.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{CompilationUnit, PackageResult, SourceRange, Symbol, SymbolKind};
use crate::error::LoadError;

/// Identifier that discards a binding. Never indexed.
const DISCARD_IDENTIFIER: &str = "_";

/// Tree-sitter query for the package clause.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

static GO_LANGUAGE: Lazy<Language> = Lazy::new(|| tree_sitter_go::LANGUAGE.into());

static PACKAGE: Lazy<Query> = Lazy::new(|| {
    Query::new(&GO_LANGUAGE, PACKAGE_QUERY).expect("package query must compile")
});

/// Holds a parsed tree-sitter tree and its source.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source bytes, kept for node text extraction.
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// 1-based line of the first syntax error, if any.
    pub fn first_error_line(&self) -> Option<usize> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }
        find_error(root).map(|n| n.start_position().row + 1)
    }
}

fn find_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(find_error)
}

/// Go declaration extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoExtractor;

impl GoExtractor {
    /// Create a new Go extractor.
    pub fn new() -> Self {
        Self
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> Option<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&GO_LANGUAGE).ok()?;
        Some(parser)
    }

    /// Parse a source file. Partial parse errors still produce a tree.
    pub fn parse(&self, path: &Path, source: &[u8]) -> Result<ParsedFile, LoadError> {
        let parse_error = || LoadError::Parse {
            path: path.to_path_buf(),
        };
        let mut parser = self.create_parser().ok_or_else(parse_error)?;
        let tree = parser.parse(source, None).ok_or_else(parse_error)?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Extract the declared package name.
    pub fn package_name(&self, parsed: &ParsedFile) -> Option<String> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&PACKAGE, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = PACKAGE.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(parsed.node_text(capture.node).to_string());
                }
            }
        }
        None
    }

    /// Append every top-level declaration of `parsed` to `result`.
    ///
    /// `unit` must hold the same text `parsed` was built from.
    pub fn extract_into(
        &self,
        parsed: &ParsedFile,
        unit: &Arc<CompilationUnit>,
        package_path: &str,
        result: &mut PackageResult,
    ) {
        let root = parsed.tree.root_node();
        let mut cursor = root.walk();

        for decl in root.named_children(&mut cursor) {
            if decl.has_error() {
                let (start, end) = line_span(decl);
                tracing::debug!(path = %parsed.path, start, end, "skipping declaration with syntax errors");
                continue;
            }
            match decl.kind() {
                "const_declaration" => {
                    for spec in specs(decl, &["const_spec"]) {
                        self.push_bindings(parsed, spec, unit, package_path, SymbolKind::Constant, &mut result.constants);
                    }
                }
                "var_declaration" => {
                    for spec in specs(decl, &["var_spec"]) {
                        self.push_bindings(parsed, spec, unit, package_path, SymbolKind::Variable, &mut result.variables);
                    }
                }
                "type_declaration" => {
                    for spec in specs(decl, &["type_spec", "type_alias"]) {
                        if let Some(name) = spec.child_by_field_name("name") {
                            result.types.push(symbol(parsed, spec, name, unit, package_path, SymbolKind::Type));
                        }
                    }
                }
                "function_declaration" => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        let kind = SymbolKind::Function { receiver: None };
                        result.functions.push(symbol(parsed, decl, name, unit, package_path, kind));
                    }
                }
                "method_declaration" => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        let kind = SymbolKind::Function {
                            receiver: self.receiver_type(parsed, decl),
                        };
                        result.functions.push(symbol(parsed, decl, name, unit, package_path, kind));
                    }
                }
                _ => {}
            }
        }
    }

    /// One symbol per named binding of a const/var spec, skipping `_`.
    fn push_bindings(
        &self,
        parsed: &ParsedFile,
        spec: Node,
        unit: &Arc<CompilationUnit>,
        package_path: &str,
        kind: SymbolKind,
        out: &mut Vec<Symbol>,
    ) {
        let mut cursor = spec.walk();
        for name in spec.children_by_field_name("name", &mut cursor) {
            if parsed.node_text(name) == DISCARD_IDENTIFIER {
                continue;
            }
            out.push(symbol(parsed, spec, name, unit, package_path, kind.clone()));
        }
    }

    /// Receiver type of a method: `"*T"` for pointer receivers, `"T"`
    /// otherwise. Type arguments are dropped.
    fn receiver_type(&self, parsed: &ParsedFile, method: Node) -> Option<String> {
        let params = method.child_by_field_name("receiver")?;
        let mut cursor = params.walk();
        let param = params
            .named_children(&mut cursor)
            .find(|n| n.kind() == "parameter_declaration")?;
        let ty = param.child_by_field_name("type")?;
        Some(render_receiver(parsed, ty))
    }
}

fn render_receiver(parsed: &ParsedFile, ty: Node) -> String {
    match ty.kind() {
        "pointer_type" => match ty.named_child(0) {
            Some(inner) => format!("*{}", render_receiver(parsed, inner).trim_start_matches('*')),
            None => parsed.node_text(ty).to_string(),
        },
        "parenthesized_type" => match ty.named_child(0) {
            Some(inner) => render_receiver(parsed, inner),
            None => parsed.node_text(ty).to_string(),
        },
        "generic_type" => match ty.child_by_field_name("type") {
            Some(base) => parsed.node_text(base).to_string(),
            None => strip_type_arguments(parsed.node_text(ty)),
        },
        _ => strip_type_arguments(parsed.node_text(ty)),
    }
}

fn strip_type_arguments(text: &str) -> String {
    text.split('[').next().unwrap_or(text).trim().to_string()
}

/// Specs of any of `kinds` directly inside a declaration or its
/// parenthesized list, in source order.
fn specs<'t>(decl: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            out.push(child);
        } else if child.kind().ends_with("_list") {
            let mut inner = child.walk();
            out.extend(child.named_children(&mut inner).filter(|n| kinds.contains(&n.kind())));
        }
    }
    out
}

fn symbol(
    parsed: &ParsedFile,
    node: Node,
    name: Node,
    unit: &Arc<CompilationUnit>,
    package_path: &str,
    kind: SymbolKind,
) -> Symbol {
    let (start, end) = line_span(node);
    Symbol::new(
        kind,
        parsed.node_text(name),
        package_path,
        SourceRange::new(unit.clone(), start, end),
    )
}

/// 1-based inclusive line span of a node.
fn line_span(node: Node) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    let mut end_line = end.row + 1;
    // A node ending at column 0 stops before that line
    if end.column == 0 && end.row > start.row {
        end_line -= 1;
    }
    (start.row + 1, end_line)
}

/// Text of every top-level import declaration, trimmed and joined by `\n`.
pub fn import_block(source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }
    let Some(mut parser) = GoExtractor::new().create_parser() else {
        return String::new();
    };
    let Some(tree) = parser.parse(source, None) else {
        return String::new();
    };

    let root = tree.root_node();
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|n| n.kind() == "import_declaration")
        .filter_map(|n| source.get(n.start_byte()..n.end_byte()))
        .map(|text| text.trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether a file opts out of every build with an `ignore` constraint.
///
/// The file is excluded only when `ignore` is required by every
/// alternative of the expression: `ignore` and `ignore && linux` exclude
/// it, `ignore || linux` and `!ignore` do not.
pub fn has_ignore_constraint(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            break;
        }
        let required = if let Some(expr) = line.strip_prefix("//go:build") {
            requires_ignore(expr.split("||"), "&&")
        } else if let Some(expr) = line.strip_prefix("// +build") {
            // Space separates alternatives, comma joins terms
            requires_ignore(expr.split_whitespace(), ",")
        } else {
            continue;
        };
        if required {
            return true;
        }
    }
    false
}

fn requires_ignore<'a>(alternatives: impl Iterator<Item = &'a str>, and: &str) -> bool {
    let mut any = false;
    for alternative in alternatives {
        any = true;
        let has_ignore = alternative
            .split(and)
            .map(|term| term.trim().trim_matches(|c| c == '(' || c == ')').trim())
            .any(|term| term == "ignore");
        if !has_ignore {
            return false;
        }
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use rstest::rstest;

    fn extract(source: &str) -> PackageResult {
        let extractor = GoExtractor::new();
        let parsed = extractor
            .parse(Path::new("test.go"), source.as_bytes())
            .unwrap();
        let unit = Arc::new(CompilationUnit::with_content(
            MemFs::new().shared(),
            "test.go",
            "example.com/pkg",
            source.to_string(),
        ));
        let mut result = PackageResult::default();
        extractor.extract_into(&parsed, &unit, "example.com/pkg", &mut result);
        result
    }

    #[test]
    fn test_extract_package() {
        let extractor = GoExtractor::new();
        let parsed = extractor.parse(Path::new("a.go"), b"package main\n").unwrap();
        assert_eq!(extractor.package_name(&parsed), Some("main".to_string()));

        let parsed = extractor.parse(Path::new("a.go"), b"// no clause\n").unwrap();
        assert_eq!(extractor.package_name(&parsed), None);
    }

    #[test]
    fn test_grouped_constants_get_own_ranges() {
        let source = "package pkg\n\nconst (\n\tA = 1\n\tB = 2\n)\n\nconst MaxRetries = 3\n";
        let result = extract(source);

        let names: Vec<_> = result.constants.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["A", "B", "MaxRetries"]);

        assert_eq!(result.constants[0].text(), "\tA = 1");
        assert_eq!(result.constants[1].text(), "\tB = 2");
        assert_eq!(result.constants[2].text(), "const MaxRetries = 3");
        assert_eq!(result.constants[1].range().start_line(), 5);
    }

    #[test]
    fn test_discard_bindings_skipped() {
        let source = r#"package pkg

var _ = register()

var (
	_      fmt.Stringer = (*T)(nil)
	Kept   int
	a, _, b = 1, 2, 3
)

const _ = 0
"#;
        let result = extract(source);

        let vars: Vec<_> = result.variables.iter().map(|v| v.name()).collect();
        assert_eq!(vars, vec!["Kept", "a", "b"]);
        assert!(result.constants.is_empty());
        assert!(result.symbols().all(|s| s.name() != "_"));
    }

    #[test]
    fn test_multi_name_spec_shares_range() {
        let result = extract("package pkg\n\nvar x, y = 1, 2\n");
        assert_eq!(result.variables.len(), 2);
        assert_eq!(result.variables[0].text(), "var x, y = 1, 2");
        assert_eq!(result.variables[1].text(), "var x, y = 1, 2");
    }

    #[test]
    fn test_extract_types_and_aliases() {
        let source = r#"package pkg

type StringA string
type StringB = string

// User is a user.
type User struct {
	ID   int64
	Name string
}

type (
	Handler interface {
		Run() error
	}
	ID = int64
)
"#;
        let result = extract(source);

        let names: Vec<_> = result.types.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["StringA", "StringB", "User", "Handler", "ID"]);

        let user = result.find_symbol("User").unwrap();
        assert_eq!(user.text(), "type User struct {\n\tID   int64\n\tName string\n}");

        let handler = result.find_symbol("Handler").unwrap();
        assert_eq!(handler.text(), "\tHandler interface {\n\t\tRun() error\n\t}");
    }

    #[test]
    fn test_extract_functions_and_methods() {
        let source = r#"package pkg

func NewService() *Service {
	return &Service{}
}

func (s *Service) CreateUser(name string) error {
	return nil
}

func (s Service) String() string { return "svc" }

func (l *List[T]) Push(v T) {}
"#;
        let result = extract(source);
        assert_eq!(result.functions.len(), 4);

        let new_service = result.find_symbol("NewService").unwrap();
        assert_eq!(new_service.receiver(), None);
        assert_eq!(new_service.index_file_name(), "func.NewService.goindex");
        assert_eq!(new_service.text(), "func NewService() *Service {\n\treturn &Service{}\n}");

        let create = result.find_symbol("CreateUser").unwrap();
        assert_eq!(create.receiver(), Some("*Service"));
        assert_eq!(create.index_file_name(), "method.Service.CreateUser.goindex");

        let string = result.find_symbol("String").unwrap();
        assert_eq!(string.receiver(), Some("Service"));
        assert_eq!(string.range().start_line(), string.range().end_line());

        let push = result.find_symbol("Push").unwrap();
        assert_eq!(push.receiver(), Some("*List"));
    }

    #[test]
    fn test_symbols_carry_package_path() {
        let result = extract("package pkg\n\nconst A = 1\nvar B = 2\ntype C int\nfunc D() {}\n");
        assert_eq!(result.symbol_count(), 4);
        assert!(result.symbols().all(|s| s.package_path() == "example.com/pkg"));
    }

    #[test]
    fn test_syntax_error_line() {
        let extractor = GoExtractor::new();
        let parsed = extractor
            .parse(Path::new("bad.go"), b"package pkg\n\nfunc broken( {\n")
            .unwrap();
        assert!(parsed.first_error_line().is_some());

        let parsed = extractor
            .parse(Path::new("ok.go"), b"package pkg\n\nfunc fine() {}\n")
            .unwrap();
        assert_eq!(parsed.first_error_line(), None);
    }

    #[test]
    fn test_import_block() {
        let source = "package main\n\nimport \"fmt\"\n\nfunc main() {}\n";
        assert_eq!(import_block(source), "import \"fmt\"");
        assert_eq!(import_block("package main\n"), "");
        assert_eq!(import_block(""), "");
    }

    #[rstest]
    #[case::plain("//go:build ignore", true)]
    #[case::conjunction("//go:build ignore && linux", true)]
    #[case::parenthesized("//go:build (ignore)", true)]
    #[case::disjunction("//go:build ignore || linux", false)]
    #[case::nested_disjunction("//go:build (ignore || linux) && amd64", false)]
    #[case::negated("//go:build !ignore", false)]
    #[case::other_tag("//go:build linux", false)]
    #[case::legacy("// +build ignore", true)]
    #[case::legacy_and("// +build ignore,linux", true)]
    #[case::legacy_or("// +build ignore linux", false)]
    fn test_ignore_constraint(#[case] header: &str, #[case] ignored: bool) {
        let source = format!("{}\n\npackage main\n", header);
        assert_eq!(has_ignore_constraint(&source), ignored);
    }

    #[test]
    fn test_constraint_after_package_clause_is_not_a_header() {
        assert!(!has_ignore_constraint("package main\n\n//go:build ignore\n"));
    }

    #[test]
    fn test_types_sharing_a_line_keep_source_order() {
        let result = extract("package pkg\n\ntype (\n\tZed = int; Alpha string\n)\n");
        let names: Vec<_> = result.types.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Zed", "Alpha"]);
    }

    #[test]
    fn test_unparsed_declarations_are_skipped() {
        let source = "package pkg\n\nconst Before = 1\n\nfunc Kept() {}\n\ntype Set[T comparable] = map[T]struct{}\n";
        let result = extract(source);
        assert!(result.find_symbol("Before").is_some());
        assert!(result.find_symbol("Kept").is_some());
        // Whatever survives recovery still slices to real source text
        assert!(result.symbols().all(|s| !s.text().is_empty()));
    }
}
