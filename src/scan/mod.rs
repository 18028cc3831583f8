//! Recursive package scanning.
//!
//! ```text
//! Discoverer ──▶ Scanner (rayon pool) ──▶ PackageLoader ──▶ GoExtractor
//!  (dir walk)     (throttle, progress)     (one package)     (symbols)
//! ```

mod discover;
mod loader;
mod pool;
mod progress;

pub use discover::{is_go_source, join_package_path, Discoverer};
pub use loader::{canonical_package_path, package_url, PackageLoader, SourceLoader};
pub use pool::Scanner;
pub use progress::ScanProgress;

use std::path::Path;

use crate::analysis::PackageResult;
use crate::error::ScanError;
use crate::fs::OsFs;

/// Scan every package below `root` on the OS filesystem.
///
/// See [`Scanner::scan_packages_recursively`].
pub fn scan_packages_recursively<F, P>(
    root: &Path,
    base_module_path: &str,
    on_package: F,
    on_progress: P,
) -> Result<usize, ScanError>
where
    F: Fn(PackageResult, &str) + Sync,
    P: Fn(&ScanProgress) + Sync,
{
    Scanner::new(OsFs::shared(), root).scan_packages_recursively(base_module_path, on_package, on_progress)
}
