//! In-memory [`FileSystem`] with failure injection.

use pkgshare_store::{FileSystem, PackageRead, PackageWrite};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    open_failures: HashMap<PathBuf, VecDeque<io::ErrorKind>>,
    failing_listings: HashSet<PathBuf>,
    failing_removals: HashSet<PathBuf>,
    failing_renames: HashSet<PathBuf>,
    open_attempts: HashMap<PathBuf, usize>,
}

impl State {
    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    fn has_children(&self, path: &Path) -> bool {
        self.dirs.iter().any(|d| d.parent() == Some(path))
            || self.files.keys().any(|f| f.parent() == Some(path))
    }
}

/// A shared, cloneable in-memory filesystem.
///
/// Clones share state, so a test can hand one clone to the store and keep
/// another to arrange files and inspect the result.
///
/// ```rust
/// use pkgshare_store::FileSystem;
/// use pkgshare_test_utils::MemoryFileSystem;
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.add_file("P:/feed/pkg/pkg.1.0.0.nupkg", b"content");
/// assert!(fs.dir_exists(Path::new("P:/feed/pkg")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<State>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Create a directory and its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.state().add_dir_all(path.as_ref());
    }

    /// Create a file, creating missing parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: &[u8]) {
        let path = path.as_ref();
        let mut state = self.state();
        if let Some(parent) = path.parent() {
            state.add_dir_all(parent);
        }
        state.files.insert(path.to_path_buf(), content.to_vec());
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state().files.get(path.as_ref()).cloned()
    }

    pub fn contains_file(&self, path: impl AsRef<Path>) -> bool {
        self.state().files.contains_key(path.as_ref())
    }

    pub fn contains_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state().dirs.contains(path.as_ref())
    }

    /// Names of the files directly inside `dir`, sorted.
    pub fn file_names(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let dir = dir.as_ref();
        self.state()
            .files
            .keys()
            .filter(|f| f.parent() == Some(dir))
            .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    /// Make the next opens of `path` fail with `kinds`, one per attempt.
    pub fn fail_opens(&self, path: impl AsRef<Path>, kinds: impl IntoIterator<Item = io::ErrorKind>) {
        self.state()
            .open_failures
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .extend(kinds);
    }

    /// Make listing `path` fail.
    pub fn fail_listing(&self, path: impl AsRef<Path>) {
        self.state()
            .failing_listings
            .insert(path.as_ref().to_path_buf());
    }

    /// Make removing the file or directory at `path` fail.
    pub fn fail_removal(&self, path: impl AsRef<Path>) {
        self.state()
            .failing_removals
            .insert(path.as_ref().to_path_buf());
    }

    /// Make renaming the file at `path` fail.
    pub fn fail_rename(&self, path: impl AsRef<Path>) {
        self.state()
            .failing_renames
            .insert(path.as_ref().to_path_buf());
    }

    /// How many times `path` was opened for reading, including failed attempts.
    pub fn open_attempts(&self, path: impl AsRef<Path>) -> usize {
        self.state()
            .open_attempts
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

fn injected(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected failure for {}", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn dir_exists(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.state().files.contains_key(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn PackageRead>> {
        let mut state = self.state();
        *state.open_attempts.entry(path.to_path_buf()).or_default() += 1;
        if let Some(kind) = state
            .open_failures
            .get_mut(path)
            .and_then(|queue| queue.pop_front())
        {
            return Err(io::Error::new(kind, format!("injected {kind:?} for {}", path.display())));
        }
        match state.files.get(path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None => Err(not_found(path)),
        }
    }

    fn create_write(&self, path: &Path) -> io::Result<Box<dyn PackageWrite>> {
        let mut state = self.state();
        let parent_exists = path.parent().is_some_and(|p| state.dirs.contains(p));
        if !parent_exists {
            return Err(not_found(path));
        }
        state.files.insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.state().add_dir_all(path);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.failing_removals.contains(path) {
            return Err(injected(path));
        }
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        if state.has_children(path) {
            return Err(io::Error::other(format!("{} is not empty", path.display())));
        }
        state.dirs.remove(path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.failing_removals.contains(path) {
            return Err(injected(path));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.failing_renames.contains(from) {
            return Err(injected(from));
        }
        let content = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    fn list_dirs(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state();
        if state.failing_listings.contains(path) {
            return Err(injected(path));
        }
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        Ok(state
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .cloned()
            .collect())
    }

    fn list_files(&self, path: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        let state = self.state();
        if state.failing_listings.contains(path) {
            return Err(injected(path));
        }
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        Ok(state
            .files
            .keys()
            .filter(|f| f.parent() == Some(path))
            .filter(|f| {
                f.extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            })
            .cloned()
            .collect())
    }

    fn is_dir_empty(&self, path: &Path) -> io::Result<bool> {
        let state = self.state();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        Ok(!state.has_children(path))
    }
}

/// Appends to a file in a [`MemoryFileSystem`].
struct MemoryWriter {
    state: Arc<Mutex<State>>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
