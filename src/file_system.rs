//! Filesystem access used by the lister and the organizer.
//!
//! The organizer never calls `std::fs` directly; it goes through the
//! [`FileSystem`] trait so the same code path can run against the real disk
//! ([`RealFs`]), an in-memory tree ([`MemoryFs`]) or a simulation that only
//! records mutations ([`DryRunFs`]).

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A direct child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirItem {
    pub path: PathBuf,
    /// True only for regular files; directories and symlinks are false.
    pub is_file: bool,
}

/// The filesystem primitives the organizer depends on.
pub trait FileSystem {
    /// Lists the direct children of `dir` in enumeration order.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirItem>>;

    /// Creates a single directory level if it does not exist yet.
    ///
    /// Returns `Ok(true)` when the directory was created and `Ok(false)` when
    /// a directory was already there. A non-directory entry at `path` is an
    /// error.
    fn ensure_dir(&self, path: &Path) -> io::Result<bool>;

    /// Returns true if any entry exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if a directory exists at `path`.
    fn is_dir(&self, path: &Path) -> bool;

    /// Moves `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

fn not_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} exists and is not a directory", path.display()),
    )
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirItem>> {
        let mut items = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let is_file = entry.file_type()?.is_file();
            items.push(DirItem {
                path: entry.path(),
                is_file,
            });
        }
        Ok(items)
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<bool> {
        match fs::create_dir(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if path.is_dir() {
                    Ok(false)
                } else {
                    Err(not_a_directory(path))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling link still blocks the destination
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    File,
    Dir,
}

/// In-memory [`FileSystem`] for tests.
///
/// Paths are compared lexically. Adding an entry also adds its missing
/// ancestors as directories. Listings come back sorted by path.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    failing_renames: RefCell<HashSet<PathBuf>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Node::Dir);
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Node::File);
    }

    /// Makes every later rename of `path` fail with `PermissionDenied`.
    pub fn fail_rename_of(&self, path: impl AsRef<Path>) {
        self.failing_renames
            .borrow_mut()
            .insert(path.as_ref().to_path_buf());
    }

    /// Removes an entry, simulating an external process deleting it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.nodes.borrow_mut().remove(path.as_ref());
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.nodes.borrow().get(path.as_ref()) == Some(&Node::File)
    }

    fn insert(&self, path: &Path, node: Node) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
        nodes.insert(path.to_path_buf(), node);
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirItem>> {
        let nodes = self.nodes.borrow();
        if nodes.get(dir) != Some(&Node::Dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }
        Ok(nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .map(|(path, node)| DirItem {
                path: path.clone(),
                is_file: *node == Node::File,
            })
            .collect())
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<bool> {
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(path) {
            Some(Node::Dir) => return Ok(false),
            Some(Node::File) => return Err(not_a_directory(path)),
            None => {}
        }
        match path.parent() {
            Some(parent) if nodes.get(parent) == Some(&Node::Dir) => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent of {} does not exist", path.display()),
                ));
            }
        }
        nodes.insert(path.to_path_buf(), Node::Dir);
        Ok(true)
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.borrow().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.nodes.borrow().get(path) == Some(&Node::Dir)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.failing_renames.borrow().contains(from) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get(from).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", from.display()),
            )
        })?;
        match to.parent() {
            Some(parent) if nodes.get(parent) == Some(&Node::Dir) => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent of {} does not exist", to.display()),
                ));
            }
        }
        nodes.remove(from);
        nodes.insert(to.to_path_buf(), node);
        Ok(())
    }
}

/// [`FileSystem`] wrapper that reads through to `inner` but only records
/// directory creations and renames.
///
/// Running the organizer over it yields the report a real run would produce
/// without touching the disk.
pub struct DryRunFs<'a> {
    inner: &'a dyn FileSystem,
    created_dirs: RefCell<BTreeSet<PathBuf>>,
    moved_in: RefCell<BTreeSet<PathBuf>>,
    moved_out: RefCell<BTreeSet<PathBuf>>,
}

impl<'a> DryRunFs<'a> {
    pub fn new(inner: &'a dyn FileSystem) -> Self {
        Self {
            inner,
            created_dirs: RefCell::new(BTreeSet::new()),
            moved_in: RefCell::new(BTreeSet::new()),
            moved_out: RefCell::new(BTreeSet::new()),
        }
    }
}

impl FileSystem for DryRunFs<'_> {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirItem>> {
        self.inner.read_dir(dir)
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<bool> {
        if self.is_dir(path) {
            return Ok(false);
        }
        if self.exists(path) {
            return Err(not_a_directory(path));
        }
        self.created_dirs.borrow_mut().insert(path.to_path_buf());
        Ok(true)
    }

    fn exists(&self, path: &Path) -> bool {
        if self.moved_out.borrow().contains(path) {
            return false;
        }
        self.created_dirs.borrow().contains(path)
            || self.moved_in.borrow().contains(path)
            || self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.created_dirs.borrow().contains(path) || self.inner.is_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if !self.exists(from) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", from.display()),
            ));
        }
        self.moved_out.borrow_mut().insert(from.to_path_buf());
        self.moved_in.borrow_mut().insert(to.to_path_buf());
        Ok(())
    }
}
