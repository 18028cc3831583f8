//! Index generation: scan a tree and emit one artifact per symbol.
//!
//! Artifacts are named so a reader can guess them without a lookup:
//! `var.<Name>.goindex`, `type.<Name>.goindex`, `func.<Name>.goindex` and
//! `method.<Receiver>.<Name>.goindex`, placed under the destination root at
//! the package's path relative to the module.

mod emitter;

pub use emitter::{artifact_content, relative_package_dir, EmitStats, Emitter};

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ScanError;
use crate::fs::{FileSystem, OsFs};
use crate::scan::{ScanProgress, Scanner};

/// Totals for a completed indexing run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub packages: usize,
    pub artifacts_written: usize,
    pub artifacts_skipped: usize,
}

/// Couples a [`Scanner`] with a destination filesystem.
pub struct Indexer {
    scanner: Scanner,
    dest_fs: Arc<dyn FileSystem>,
}

impl Indexer {
    pub fn new(scanner: Scanner, dest_fs: Arc<dyn FileSystem>) -> Self {
        Self { scanner, dest_fs }
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Scan every package and write its artifacts below `dest_root`.
    ///
    /// Individual artifacts that cannot be written are skipped and counted.
    /// A package that fails to load aborts the run.
    pub fn index_source_code<P>(
        &self,
        base_module_path: &str,
        dest_root: &Path,
        on_progress: P,
    ) -> Result<IndexStats, ScanError>
    where
        P: Fn(&ScanProgress) + Sync,
    {
        let emitter = Emitter::new(self.dest_fs.clone(), dest_root);
        let stats = Mutex::new(IndexStats::default());

        let packages = self.scanner.scan_packages_recursively(
            base_module_path,
            |result, url| {
                let emitted = emitter.emit_package(&result, url, base_module_path);
                let mut stats = stats.lock();
                stats.artifacts_written += emitted.written;
                stats.artifacts_skipped += emitted.skipped;
            },
            on_progress,
        )?;

        let mut stats = stats.into_inner();
        stats.packages = packages;
        tracing::info!(
            packages = stats.packages,
            written = stats.artifacts_written,
            skipped = stats.artifacts_skipped,
            dest = %dest_root.display(),
            "index complete"
        );
        Ok(stats)
    }
}

/// Index `root` into `dest_root` on the OS filesystem.
pub fn index_source_code<P>(
    root: &Path,
    base_module_path: &str,
    dest_root: &Path,
    on_progress: P,
) -> Result<IndexStats, ScanError>
where
    P: Fn(&ScanProgress) + Sync,
{
    let scanner = Scanner::new(OsFs::shared(), root);
    Indexer::new(scanner, OsFs::shared()).index_source_code(base_module_path, dest_root, on_progress)
}
