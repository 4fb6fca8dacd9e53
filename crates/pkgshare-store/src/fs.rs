//! Filesystem capability used by the store and the sweeper
//!
//! Everything the store does to the share goes through [`FileSystem`], so
//! tests can bind an in-memory implementation while production binds
//! [`LocalFileSystem`].

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A readable, seekable package stream.
pub trait PackageRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> PackageRead for T {}

/// A writable package stream.
pub trait PackageWrite: Write + Send {}

impl<T: Write + Send> PackageWrite for T {}

/// File operations needed over the package tree.
pub trait FileSystem: Send + Sync {
    fn dir_exists(&self, path: &Path) -> bool;

    fn file_exists(&self, path: &Path) -> bool;

    /// Open for reading; other readers and deleters are not blocked.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn PackageRead>>;

    /// Create or truncate for writing; deleters are not blocked.
    fn create_write(&self, path: &Path) -> io::Result<Box<dyn PackageWrite>>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Immediate subdirectories of `path`.
    fn list_dirs(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Immediate files of `path` whose extension matches `extension`, ignoring case.
    fn list_files(&self, path: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;

    fn is_dir_empty(&self, path: &Path) -> io::Result<bool>;
}

#[cfg(windows)]
mod share {
    pub const FILE_SHARE_READ: u32 = 0x0000_0001;
    pub const FILE_SHARE_DELETE: u32 = 0x0000_0004;
}

/// [`FileSystem`] over the local (mapped) filesystem.
///
/// Every call is timed and logged at debug level, since latency on the share
/// is the first thing to look at when the feed slows down.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// Logs the wrapped operation's duration when dropped.
struct Timed<'a> {
    operation: &'static str,
    path: &'a Path,
    started: Instant,
}

impl<'a> Timed<'a> {
    fn start(operation: &'static str, path: &'a Path) -> Self {
        Self {
            operation,
            path,
            started: Instant::now(),
        }
    }
}

impl Drop for Timed<'_> {
    fn drop(&mut self) {
        tracing::debug!(
            operation = self.operation,
            path = %self.path.display(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Filesystem call finished"
        );
    }
}

impl FileSystem for LocalFileSystem {
    fn dir_exists(&self, path: &Path) -> bool {
        let _timed = Timed::start("dir_exists", path);
        path.is_dir()
    }

    fn file_exists(&self, path: &Path) -> bool {
        let _timed = Timed::start("file_exists", path);
        path.is_file()
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn PackageRead>> {
        let _timed = Timed::start("open_read", path);
        let mut options = OpenOptions::new();
        options.read(true);
        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            options.share_mode(share::FILE_SHARE_READ | share::FILE_SHARE_DELETE);
        }
        let file = options.open(path)?;
        Ok(Box::new(file))
    }

    fn create_write(&self, path: &Path) -> io::Result<Box<dyn PackageWrite>> {
        let _timed = Timed::start("create_write", path);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            options.share_mode(share::FILE_SHARE_DELETE);
        }
        let file = options.open(path)?;
        Ok(Box::new(file))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let _timed = Timed::start("create_dir_all", path);
        fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let _timed = Timed::start("remove_dir", path);
        fs::remove_dir(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let _timed = Timed::start("remove_file", path);
        fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let _timed = Timed::start("rename", from);
        fs::rename(from, to)
    }

    fn list_dirs(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let _timed = Timed::start("list_dirs", path);
        let mut dirs = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn list_files(&self, path: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        let _timed = Timed::start("list_files", path);
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let entry_path = entry.path();
            let matches = entry_path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
            if matches && entry.file_type()?.is_file() {
                files.push(entry_path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn is_dir_empty(&self, path: &Path) -> io::Result<bool> {
        let _timed = Timed::start("is_dir_empty", path);
        Ok(fs::read_dir(path)?.next().is_none())
    }
}
