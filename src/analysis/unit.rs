//! Compilation units with a one-shot content cache.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::fs::FileSystem;

/// One Go source file belonging to exactly one package.
///
/// The raw text is read lazily through the injected filesystem and cached;
/// concurrent callers of [`CompilationUnit::text`] observe at most one read.
pub struct CompilationUnit {
    path: PathBuf,
    package_path: String,
    fs: Arc<dyn FileSystem>,
    content: OnceCell<String>,
}

impl CompilationUnit {
    /// Create a unit whose content will be read from `fs` on first use.
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, package_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package_path: package_path.into(),
            fs,
            content: OnceCell::new(),
        }
    }

    /// Create a unit with its content already cached.
    pub fn with_content(
        fs: Arc<dyn FileSystem>,
        path: impl Into<PathBuf>,
        package_path: impl Into<String>,
        content: String,
    ) -> Self {
        let unit = Self::new(fs, path, package_path);
        // Fresh cell, cannot already be set
        let _ = unit.content.set(content);
        unit
    }

    /// Path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Canonical package path this unit belongs to.
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    /// Full source text. Empty if the file cannot be read.
    pub fn text(&self) -> &str {
        self.content.get_or_init(|| match self.fs.read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read compilation unit");
                String::new()
            }
        })
    }

    /// Whether the content has been loaded.
    pub fn is_cached(&self) -> bool {
        self.content.get().is_some()
    }

    /// The file's import declarations, joined by newlines.
    ///
    /// Derived from the cached text on every call.
    pub fn imports(&self) -> String {
        super::go::import_block(self.text())
    }
}

impl fmt::Debug for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationUnit")
            .field("path", &self.path)
            .field("package_path", &self.package_path)
            .field("cached", &self.is_cached())
            .finish()
    }
}
