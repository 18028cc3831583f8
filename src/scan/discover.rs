//! Recursive package discovery.

use std::path::Path;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use phf::phf_set;

use crate::fs::FileSystem;

/// Directory names never treated as packages.
static RESERVED_DIRS: phf::Set<&'static str> = phf_set! {
    "vendor",
    "testdata",
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    ".idea",
    ".vscode",
};

/// Whether a file name is a non-test Go compilation unit.
pub fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.ends_with("_test.go")
}

/// Join a relative package path and a child segment with `/`.
pub fn join_package_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Walks a source tree and lists every candidate package path.
#[derive(Debug, Clone)]
pub struct Discoverer {
    fs: Arc<dyn FileSystem>,
    excludes: Option<GlobSet>,
}

impl Discoverer {
    /// Create a discoverer over `fs`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs, excludes: None }
    }

    /// Skip directories whose root-relative path matches any of `patterns`.
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> anyhow::Result<Self> {
        if patterns.is_empty() {
            self.excludes = None;
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid exclude pattern {:?}: {}", pattern, e))?;
            builder.add(glob);
        }
        self.excludes = Some(builder.build()?);
        Ok(self)
    }

    /// List package paths under `root`, relative to it and `/`-separated.
    ///
    /// The root itself is always present as `""`. A directory is listed when
    /// it, or any directory below it, holds Go source files, so an empty
    /// middle directory (`a` in `a/b/c.go`) still appears. Hidden and
    /// reserved directories are skipped. Unreadable directories count as
    /// having no sub-packages.
    pub fn discover(&self, root: &Path) -> Vec<String> {
        let mut packages = Vec::new();
        self.visit(root, "", &mut packages);

        if !packages.iter().any(|p| p.is_empty()) {
            packages.push(String::new());
        }
        packages.sort();
        packages
    }

    /// Returns whether `rel` or a descendant holds Go sources.
    fn visit(&self, root: &Path, rel: &str, packages: &mut Vec<String>) -> bool {
        let dir = if rel.is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel)
        };

        let entries = match self.fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                return false;
            }
        };

        let mut has_sources = false;
        let mut children = Vec::new();
        for entry in entries {
            if !entry.is_dir {
                has_sources |= is_go_source(&entry.name);
                continue;
            }
            let child = join_package_path(rel, &entry.name);
            if self.is_skipped(&entry.name, &child) {
                continue;
            }
            if self.visit(root, &child, &mut children) {
                has_sources = true;
            }
        }

        if has_sources {
            packages.push(rel.to_string());
            packages.append(&mut children);
        }
        has_sources
    }

    fn is_skipped(&self, name: &str, rel: &str) -> bool {
        if name.starts_with('.') || RESERVED_DIRS.contains(name) {
            return true;
        }
        self.excludes
            .as_ref()
            .map(|set| set.is_match(rel))
            .unwrap_or(false)
    }
}
