//! Package loading: one directory in, one `PackageResult` out.

use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::{has_ignore_constraint, CompilationUnit, GoExtractor, PackageResult, ParsedFile};
use crate::error::LoadError;
use crate::fs::FileSystem;

use super::discover::is_go_source;

/// Loads a single package given its root-relative path.
///
/// A hard failure is an `Err`. A directory with no Go sources is an empty
/// `PackageResult`, not an error.
pub trait PackageLoader: Send + Sync {
    fn load_package(
        &self,
        relative_path: &str,
        base_module_path: &str,
    ) -> Result<PackageResult, LoadError>;
}

/// Canonical import path of a package.
///
/// Combines the module path, every segment of `relative_path` but the last,
/// and the package name declared in source. The root package (empty
/// `relative_path`) is the module path itself.
pub fn canonical_package_path(base_module_path: &str, relative_path: &str, declared_name: &str) -> String {
    let base = base_module_path.trim_end_matches('/');
    let mut segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return base.to_string();
    }

    segments.pop();
    segments.push(declared_name);
    let tail = segments.join("/");
    if base.is_empty() {
        tail
    } else {
        format!("{}/{}", base, tail)
    }
}

/// Directory-based package URL used to address a package in the output tree.
pub fn package_url(base_module_path: &str, relative_path: &str) -> String {
    let base = base_module_path.trim_end_matches('/');
    let rel = relative_path.trim_matches('/');
    match (base.is_empty(), rel.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => rel.to_string(),
        (false, false) => format!("{}/{}", base, rel),
    }
}

/// Loads Go packages from a source tree with tree-sitter.
#[derive(Debug)]
pub struct SourceLoader {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    extractor: GoExtractor,
}

impl SourceLoader {
    /// Create a loader for packages below `root`.
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
            extractor: GoExtractor::new(),
        }
    }

    fn package_dir(&self, relative_path: &str) -> PathBuf {
        if relative_path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative_path)
        }
    }
}

impl PackageLoader for SourceLoader {
    fn load_package(
        &self,
        relative_path: &str,
        base_module_path: &str,
    ) -> Result<PackageResult, LoadError> {
        let dir = self.package_dir(relative_path);
        let entries = self.fs.read_dir(&dir).map_err(|source| LoadError::Unreadable {
            path: dir.clone(),
            source,
        })?;

        let mut declared: Option<String> = None;
        let mut sources: Vec<(PathBuf, String, ParsedFile)> = Vec::new();

        for entry in entries.iter().filter(|e| !e.is_dir && is_go_source(&e.name)) {
            let path = dir.join(&entry.name);
            let bytes = self.fs.read(&path).map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })?;
            let text = String::from_utf8_lossy(&bytes).into_owned();

            if has_ignore_constraint(&text) {
                tracing::debug!(path = %path.display(), "skipping file excluded from builds");
                continue;
            }

            let parsed = self.extractor.parse(&path, text.as_bytes())?;
            if let Some(line) = parsed.first_error_line() {
                // Grammar gaps (e.g. generic aliases) only cost the affected declarations
                tracing::warn!(path = %path.display(), line, "source has syntax errors, skipping unparsed declarations");
            }
            let name = self
                .extractor
                .package_name(&parsed)
                .ok_or_else(|| LoadError::MissingPackageClause { path: path.clone() })?;

            match &declared {
                Some(first) if *first != name => {
                    return Err(LoadError::MultiplePackages {
                        dir,
                        first: first.clone(),
                        second: name,
                    });
                }
                Some(_) => {}
                None => declared = Some(name),
            }
            sources.push((path, text, parsed));
        }

        let Some(declared) = declared else {
            return Ok(PackageResult::default());
        };

        let package_path = canonical_package_path(base_module_path, relative_path, &declared);
        let mut result = PackageResult::default();
        for (path, text, parsed) in sources {
            let unit = Arc::new(CompilationUnit::with_content(
                self.fs.clone(),
                path,
                package_path.clone(),
                text,
            ));
            self.extractor.extract_into(&parsed, &unit, &package_path, &mut result);
            result.files.push(unit);
        }

        tracing::debug!(
            package = %package_path,
            files = result.files.len(),
            symbols = result.symbol_count(),
            "loaded package"
        );
        Ok(result)
    }
}
