//! Config file I/O
//!
//! Saves go through a sibling temp file that is locked, synced and renamed
//! into place, so a concurrent `load` sees either the old file or the new one.

use crate::{Error, NormalizedPath, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Removes the temp file unless the write was committed.
struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Replace `path` with `content` without exposing a partial file.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let target = path.to_native();
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut pending = PendingFile {
        path: temp_path_for(&target),
        committed: false,
    };
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&pending.path)
        .map_err(|e| Error::io(&pending.path, e))?;
    write_locked(file, &target, &pending.path, content)?;

    fs::rename(&pending.path, &target).map_err(|e| Error::io(&target, e))?;
    pending.committed = true;
    Ok(())
}

// Same directory keeps the rename on one filesystem.
fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn write_locked(mut file: File, target: &Path, temp: &Path, content: &[u8]) -> Result<()> {
    let lock_failed = |_| Error::LockFailed {
        path: target.to_path_buf(),
    };
    file.lock_exclusive().map_err(lock_failed)?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::io(temp, e))?;
    file.unlock().map_err(lock_failed)
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
