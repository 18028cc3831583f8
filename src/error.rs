//! Error taxonomy for scanning and indexing.
//!
//! Only package load failures travel up as `Err`. Discovery failures and
//! artifact write failures are logged where they happen, an empty package is
//! an ordinary empty result, and an invalid line range yields empty text.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A hard failure while loading a single package.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read package directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read source file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse Go source: {}", path.display())]
    Parse { path: PathBuf },
    #[error("missing package clause: {}", path.display())]
    MissingPackageClause { path: PathBuf },
    #[error("found packages {first} and {second} in {}", dir.display())]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
}

/// Failure to emit one index artifact. Logged, never returned from a scan.
#[derive(Error, Debug)]
pub enum ArtifactWriteError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write index file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Terminal error of a recursive scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to load package {package:?}: {source}")]
    Load {
        package: String,
        #[source]
        source: LoadError,
    },
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ScanError {
    /// The package path whose load failed, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            ScanError::Load { package, .. } => Some(package),
            ScanError::Pool(_) => None,
        }
    }
}
