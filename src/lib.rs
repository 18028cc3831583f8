//! goindex - per-declaration index of Go source trees.
//!
//! goindex walks a Go module, loads every package with tree-sitter and writes
//! one small artifact per top-level declaration. Each artifact holds the
//! declaring package path, the import block of its file and the exact source
//! text of the declaration.
//!
//! # Architecture
//!
//! - `fs`: filesystem abstraction (OS and in-memory)
//! - `config`: CPU throttling and go.mod discovery
//! - `analysis`: compilation units, symbols and the Go extractor
//! - `scan`: package discovery and the throttled worker pool
//! - `index`: artifact naming and emission
//! - `report`: output formatting (pretty, JSON)
//! - `error`: error types

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod index;
pub mod report;
pub mod scan;

pub use analysis::{CompilationUnit, GoExtractor, PackageResult, SourceRange, Symbol, SymbolKind};
pub use config::ThrottleConfig;
pub use error::{ArtifactWriteError, LoadError, ScanError};
pub use fs::{FileSystem, MemFs, OsFs};
pub use index::{index_source_code, IndexStats, Indexer};
pub use scan::{scan_packages_recursively, PackageLoader, ScanProgress, Scanner, SourceLoader};
