//! Symbols, line ranges and per-package scan results.

use std::fmt;
use std::sync::Arc;

use super::CompilationUnit;

/// Extension of every emitted index artifact.
pub const INDEX_FILE_EXTENSION: &str = "goindex";

/// Inclusive, 1-based line range inside a compilation unit.
#[derive(Debug, Clone)]
pub struct SourceRange {
    unit: Option<Arc<CompilationUnit>>,
    start_line: usize,
    end_line: usize,
}

impl SourceRange {
    /// Create a range over `unit`.
    pub fn new(unit: Arc<CompilationUnit>, start_line: usize, end_line: usize) -> Self {
        Self {
            unit: Some(unit),
            start_line,
            end_line,
        }
    }

    /// A range with no backing unit. Its text is always empty.
    pub fn detached(start_line: usize, end_line: usize) -> Self {
        Self {
            unit: None,
            start_line,
            end_line,
        }
    }

    /// The compilation unit this range points into.
    pub fn unit(&self) -> Option<&Arc<CompilationUnit>> {
        self.unit.as_ref()
    }

    /// First line (1-based, inclusive).
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Last line (1-based, inclusive).
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// The exact source lines covered by this range, or `""` if the range
    /// is out of bounds or has no unit.
    pub fn text(&self) -> String {
        match &self.unit {
            Some(unit) => slice_lines(unit.text(), self.start_line, self.end_line),
            None => String::new(),
        }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(
                f,
                "{}:{}-{}",
                unit.path().display(),
                self.start_line,
                self.end_line
            ),
            None => write!(f, "<detached>:{}-{}", self.start_line, self.end_line),
        }
    }
}

/// Return lines `start..=end` (1-based) of `content` joined with `\n`, with
/// carriage returns removed.
///
/// Returns `""` when `content` is empty or the range is invalid:
/// `start < 1`, `start > end`, or `end` past the last line.
pub fn slice_lines(content: &str, start: usize, end: usize) -> String {
    if content.is_empty() || start < 1 || start > end {
        return String::new();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    if end > lines.len() {
        return String::new();
    }

    lines[start - 1..end].join("\n").replace('\r', "")
}

/// The kind of a top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Constant,
    Variable,
    Type,
    /// A function, or a method when `receiver` is set (`"*T"` or `"T"`).
    Function { receiver: Option<String> },
}

impl SymbolKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Constant => "const",
            SymbolKind::Variable => "var",
            SymbolKind::Type => "type",
            SymbolKind::Function { receiver: None } => "func",
            SymbolKind::Function { receiver: Some(_) } => "method",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A top-level named declaration subject to indexing.
///
/// The package path is fixed at scan time.
#[derive(Debug, Clone)]
pub struct Symbol {
    kind: SymbolKind,
    name: String,
    package_path: String,
    range: SourceRange,
}

impl Symbol {
    /// Create a new symbol.
    pub fn new(
        kind: SymbolKind,
        name: impl Into<String>,
        package_path: impl Into<String>,
        range: SourceRange,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            package_path: package_path.into(),
            range,
        }
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical package path of the declaring package.
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    /// Receiver type for methods (`"*T"` or `"T"`), `None` otherwise.
    pub fn receiver(&self) -> Option<&str> {
        match &self.kind {
            SymbolKind::Function { receiver } => receiver.as_deref(),
            _ => None,
        }
    }

    /// Exact source text of the declaration.
    pub fn text(&self) -> String {
        self.range.text()
    }

    /// Import block of the declaring compilation unit.
    pub fn imports(&self) -> String {
        self.range
            .unit()
            .map(|unit| unit.imports())
            .unwrap_or_default()
    }

    /// Predictable artifact file name, see [`index_file_name`].
    pub fn index_file_name(&self) -> String {
        index_file_name(&self.kind, &self.name)
    }
}

/// Deterministic artifact name for a declaration.
///
/// - constants and variables: `var.<Name>.goindex`
/// - types: `type.<Name>.goindex`
/// - functions: `func.<Name>.goindex`
/// - methods: `method.<Receiver>.<Name>.goindex`, pointer marker removed
pub fn index_file_name(kind: &SymbolKind, name: &str) -> String {
    match kind {
        SymbolKind::Constant | SymbolKind::Variable => {
            format!("var.{}.{}", name, INDEX_FILE_EXTENSION)
        }
        SymbolKind::Type => format!("type.{}.{}", name, INDEX_FILE_EXTENSION),
        SymbolKind::Function { receiver: None } => {
            format!("func.{}.{}", name, INDEX_FILE_EXTENSION)
        }
        SymbolKind::Function {
            receiver: Some(receiver),
        } => format!(
            "method.{}.{}.{}",
            receiver.trim_start_matches('*'),
            name,
            INDEX_FILE_EXTENSION
        ),
    }
}

/// Everything extracted from one package. Built once per load.
#[derive(Debug, Clone, Default)]
pub struct PackageResult {
    pub files: Vec<Arc<CompilationUnit>>,
    pub constants: Vec<Symbol>,
    pub variables: Vec<Symbol>,
    pub types: Vec<Symbol>,
    pub functions: Vec<Symbol>,
}

impl PackageResult {
    /// Whether the package produced no compilation units.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of symbols across all kinds.
    pub fn symbol_count(&self) -> usize {
        self.constants.len() + self.variables.len() + self.types.len() + self.functions.len()
    }

    /// All symbols: constants, variables, types, then functions.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.constants
            .iter()
            .chain(&self.variables)
            .chain(&self.types)
            .chain(&self.functions)
    }

    /// Find a symbol by name.
    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols().find(|s| s.name() == name)
    }

    /// Methods declared on `receiver` (pointer marker ignored).
    pub fn methods_of<'a>(&'a self, receiver: &'a str) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.functions
            .iter()
            .filter(move |f| f.receiver().map(|r| r.trim_start_matches('*')) == Some(receiver))
    }
}
