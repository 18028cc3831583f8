//! Declaration extraction for Go compilation units.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ CompilationUnit  │────▶│ GoExtractor  │────▶│ Symbols       │
//! │ (cached text)    │     │ (tree-sitter)│     │ (SourceRange) │
//! └──────────────────┘     └──────────────┘     └───────────────┘
//!          ▲                                            │
//!          └──────────── slice_lines ◀──────────────────┘
//! ```
//!
//! Symbols never copy source text. They keep a line range into their
//! compilation unit and slice the cached content on demand.

mod facts;
mod go;
mod unit;

pub use facts::{
    index_file_name, slice_lines, PackageResult, SourceRange, Symbol, SymbolKind,
    INDEX_FILE_EXTENSION,
};
pub use go::{has_ignore_constraint, import_block, GoExtractor, ParsedFile};
pub use unit::CompilationUnit;
