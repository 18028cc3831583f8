//! Filesystem abstraction used by discovery, loading and emission.
//!
//! Every component receives an `Arc<dyn FileSystem>` instead of touching
//! `std::fs` directly, so scans can run against an in-memory tree in tests
//! and source/destination trees can live on different backends.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name (last path component).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Read/write contract consumed by the indexer.
///
/// Implementations must be safe for concurrent reads from many workers.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// List the direct children of `path`, sorted by name.
    ///
    /// A symlink to a directory is reported as a non-directory entry.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create `path` and all missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate a file and write `contents` to it.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The host operating system's filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl OsFs {
    /// Shared handle to the OS filesystem.
    pub fn shared() -> Arc<dyn FileSystem> {
        Arc::new(OsFs)
    }
}

impl FileSystem for OsFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            // Symlinks are never walked into, so a link back up the tree cannot loop
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

#[derive(Debug, Clone)]
enum MemNode {
    Dir,
    File(Vec<u8>),
}

/// In-memory filesystem.
///
/// Paths are normalized by dropping `.` components, so `a/./b` and `a/b`
/// address the same node. The empty path and `/` are always directories.
#[derive(Debug, Default)]
pub struct MemFs {
    nodes: RwLock<BTreeMap<PathBuf, MemNode>>,
}

impl MemFs {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem pre-populated with `(path, contents)` pairs.
    /// Parent directories are created implicitly.
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: AsRef<Path>,
        C: AsRef<[u8]>,
    {
        let fs = Self::new();
        for (path, contents) in files {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                // Cannot fail on a fresh tree unless the caller nests a file
                // under another file, which is a fixture bug.
                let _ = fs.create_dir_all(parent);
            }
            let _ = fs.write(path, contents.as_ref());
        }
        fs
    }

    /// Shared handle, convenient for passing into the indexer.
    pub fn shared(self) -> Arc<dyn FileSystem> {
        Arc::new(self)
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.nodes
            .read()
            .iter()
            .filter(|(_, node)| matches!(node, MemNode::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn normalize(path: &Path) -> PathBuf {
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }

    fn is_root(path: &Path) -> bool {
        !path
            .components()
            .any(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
    }
}

impl FileSystem for MemFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let key = Self::normalize(path);
        let nodes = self.nodes.read();

        if !Self::is_root(&key) {
            match nodes.get(&key) {
                Some(MemNode::Dir) => {}
                Some(MemNode::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("not a directory: {}", path.display()),
                    ))
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no such directory: {}", path.display()),
                    ))
                }
            }
        }

        // BTreeMap iteration keeps the listing sorted by name
        let entries = nodes
            .iter()
            .filter(|(candidate, _)| candidate.parent() == Some(key.as_path()))
            .filter_map(|(candidate, node)| {
                let name = candidate.file_name()?.to_string_lossy().to_string();
                Some(DirEntry {
                    name,
                    is_dir: matches!(node, MemNode::Dir),
                })
            })
            .collect();
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.nodes.read().get(&Self::normalize(path)) {
            Some(MemNode::File(contents)) => Ok(contents.clone()),
            Some(MemNode::Dir) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )),
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let key = Self::normalize(path);
        Self::is_root(&key) || matches!(self.nodes.read().get(&key), Some(MemNode::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write();

        let mut current = PathBuf::new();
        for component in key.components() {
            current.push(component);
            if Self::is_root(&current) {
                continue;
            }
            match nodes.get(&current) {
                Some(MemNode::Dir) => {}
                Some(MemNode::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("file exists: {}", current.display()),
                    ))
                }
                None => {
                    nodes.insert(current.clone(), MemNode::Dir);
                }
            }
        }
        Ok(())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write();

        if let Some(parent) = key.parent() {
            if !Self::is_root(parent) && !matches!(nodes.get(parent), Some(MemNode::Dir)) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent directory missing: {}", parent.display()),
                ));
            }
        }
        if matches!(nodes.get(&key), Some(MemNode::Dir)) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            ));
        }

        nodes.insert(key, MemNode::File(contents.to_vec()));
        Ok(())
    }
}
