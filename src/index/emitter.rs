//! Writes one index artifact per symbol.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::analysis::{PackageResult, Symbol};
use crate::error::ArtifactWriteError;
use crate::fs::FileSystem;

/// Counts for one emission batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmitStats {
    pub written: usize,
    pub skipped: usize,
}

/// Artifact body: package header, import block, declaration text.
pub fn artifact_content(package_path: &str, imports: &str, source: &str) -> String {
    format!("package {}\n{}\n{}\n", package_path, imports, source)
}

/// Relative destination directory for a package: its URL with the module
/// prefix removed.
pub fn relative_package_dir(package_url: &str, base_module_path: &str) -> String {
    let base = base_module_path.trim_end_matches('/');
    match package_url.strip_prefix(base) {
        Some(rest) if base.is_empty() || rest.is_empty() || rest.starts_with('/') => {
            rest.trim_start_matches('/').to_string()
        }
        _ => package_url.trim_start_matches('/').to_string(),
    }
}

/// Emits artifacts into a destination tree mirroring the package hierarchy.
///
/// Failures are per artifact: a directory or file that cannot be written is
/// logged and skipped, the rest of the batch continues.
#[derive(Debug, Clone)]
pub struct Emitter {
    fs: Arc<dyn FileSystem>,
    dest_root: PathBuf,
}

impl Emitter {
    pub fn new(fs: Arc<dyn FileSystem>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dest_root: dest_root.into(),
        }
    }

    /// Destination directory for a package URL.
    pub fn package_dir(&self, package_url: &str, base_module_path: &str) -> PathBuf {
        let rel = relative_package_dir(package_url, base_module_path);
        if rel.is_empty() {
            self.dest_root.clone()
        } else {
            self.dest_root.join(rel)
        }
    }

    /// Write every symbol of `result`.
    pub fn emit_package(&self, result: &PackageResult, package_url: &str, base_module_path: &str) -> EmitStats {
        let dir = self.package_dir(package_url, base_module_path);
        // Import blocks are per unit; derive each one once per batch
        let mut imports: HashMap<PathBuf, String> = HashMap::new();
        let mut stats = EmitStats::default();

        for symbol in result.symbols() {
            let import_block = match symbol.range().unit() {
                Some(unit) => imports
                    .entry(unit.path().to_path_buf())
                    .or_insert_with(|| unit.imports())
                    .clone(),
                None => String::new(),
            };

            match self.emit_symbol(&dir, symbol, &import_block) {
                Ok(_) => stats.written += 1,
                Err(e) => {
                    tracing::warn!(symbol = symbol.name(), error = %e, "skipping index artifact");
                    stats.skipped += 1;
                }
            }
        }

        stats
    }

    /// Write a single artifact and return its path.
    pub fn emit_symbol(&self, dir: &Path, symbol: &Symbol, imports: &str) -> Result<PathBuf, ArtifactWriteError> {
        self.fs
            .create_dir_all(dir)
            .map_err(|source| ArtifactWriteError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let path = dir.join(symbol.index_file_name());
        let content = artifact_content(symbol.package_path(), imports, &symbol.text());
        self.fs
            .write(&path, content.as_bytes())
            .map_err(|source| ArtifactWriteError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
