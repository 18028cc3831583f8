//! Throttled, concurrent scanning of discovered packages.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::analysis::PackageResult;
use crate::config::ThrottleConfig;
use crate::error::ScanError;
use crate::fs::FileSystem;

use super::discover::Discoverer;
use super::loader::{package_url, PackageLoader, SourceLoader};
use super::progress::ScanProgress;

/// Discovers every package below a root and loads them on a bounded pool.
///
/// Discovery finishes before any load starts, so `total` never changes
/// while workers run.
pub struct Scanner {
    root: PathBuf,
    discoverer: Discoverer,
    loader: Arc<dyn PackageLoader>,
    throttle: ThrottleConfig,
}

impl Scanner {
    /// Create a scanner reading sources from `fs` below `root`.
    ///
    /// Throttling defaults to the `GOINDEX_CPU_LIMIT` environment setting.
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            discoverer: Discoverer::new(fs.clone()),
            loader: Arc::new(SourceLoader::new(fs, root.clone())),
            root,
            throttle: ThrottleConfig::from_env(),
        }
    }

    /// Replace the package loader.
    pub fn with_loader(mut self, loader: Arc<dyn PackageLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the throttling configuration.
    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    /// Skip directories matching any of the glob `patterns`.
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> anyhow::Result<Self> {
        self.discoverer = self.discoverer.with_excludes(patterns)?;
        Ok(self)
    }

    /// The scanned root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active throttling configuration.
    pub fn throttle(&self) -> &ThrottleConfig {
        &self.throttle
    }

    /// Package paths that a scan would visit, relative to the root.
    pub fn discover(&self) -> Vec<String> {
        self.discoverer.discover(&self.root)
    }

    /// Scan every package below the root.
    ///
    /// `on_package` receives each loaded package with its directory-based
    /// URL, in no particular order. `on_progress` fires once per dispatched
    /// package and once more at 100% after all loads succeed. Both run under
    /// one lock, so they never overlap.
    ///
    /// The first load failure aborts the scan. Packages already in flight
    /// finish before the error is returned.
    pub fn scan_packages_recursively<F, P>(
        &self,
        base_module_path: &str,
        on_package: F,
        on_progress: P,
    ) -> Result<usize, ScanError>
    where
        F: Fn(PackageResult, &str) + Sync,
        P: Fn(&ScanProgress) + Sync,
    {
        let packages = self.discover();
        let total = packages.len();
        let workers = self.throttle.pool_size(total);

        tracing::info!(
            root = %self.root.display(),
            packages = total,
            workers,
            cpu_limit = self.throttle.cpu_limit_percent,
            "starting package scan"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("goindex-scan-{}", i))
            .build()?;

        let completed = Mutex::new(0usize);
        let pre_delay = self.throttle.worker_delay;
        let post_delay = self.throttle.post_work_delay();

        pool.install(|| {
            packages.par_iter().try_for_each(|relative_path| {
                let url = package_url(base_module_path, relative_path);
                {
                    let done = completed.lock();
                    on_progress(&ScanProgress::new(*done, total, url.as_str()));
                }

                if !pre_delay.is_zero() {
                    thread::sleep(pre_delay);
                }

                let result = self
                    .loader
                    .load_package(relative_path, base_module_path)
                    .map_err(|source| ScanError::Load {
                        package: url.clone(),
                        source,
                    })?;
                tracing::debug!(package = %url, symbols = result.symbol_count(), "loaded package");

                {
                    let mut done = completed.lock();
                    *done += 1;
                    on_package(result, &url);
                }

                if !post_delay.is_zero() {
                    thread::sleep(post_delay);
                }
                Ok::<(), ScanError>(())
            })
        })?;

        on_progress(&ScanProgress::new(total, total, ""));
        tracing::info!(packages = total, "package scan finished");
        Ok(total)
    }
}
