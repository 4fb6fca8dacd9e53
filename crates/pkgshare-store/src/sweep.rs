//! Consistency check and repair of the package tree
//!
//! The sweep walks `<root>/<id>/*.nupkg`, asks the index to validate each
//! artifact, renames artifacts whose file name does not match the identity
//! in their manifest, and removes package directories with no artifacts.
//!
//! Failures on one artifact are reported to the index and the walk goes on.
//! Failing to list the root at all ends the sweep early. Neither surfaces as
//! an error to the caller: the [`SweepReport`] records what happened.

use crate::fs::FileSystem;
use crate::identity::PACKAGE_EXTENSION;
use crate::index::{IndexingFailure, PackageIndex};
use crate::manifest::PackageReader;
use crate::retry::{RetryPolicy, open_read_with_retry};
use crate::{Error, Result};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// What the sweep did with one package directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryOutcome {
    /// Held at least one artifact and was kept.
    Populated,
    /// Held no artifacts and was deleted.
    Removed,
    /// Held no artifacts but could not be deleted.
    RemovalFailed,
    /// Its artifacts could not be listed; left untouched.
    Unreadable,
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// The root could not be listed and no directory was visited.
    pub aborted: bool,
    pub directories: Vec<(PathBuf, DirectoryOutcome)>,
    /// Artifact files found across all directories.
    pub inspected: usize,
    /// Artifacts that vanished before they could be opened.
    pub missing: usize,
    /// Artifacts the index declined.
    pub rejected: usize,
    pub renamed: usize,
    pub rename_failures: usize,
    /// Artifacts reported to the index as failed.
    pub failed: usize,
}

impl SweepReport {
    /// Outcome for the directory named `name`, if it was visited.
    pub fn outcome(&self, name: &str) -> Option<DirectoryOutcome> {
        self.directories
            .iter()
            .find(|(path, _)| path.file_name().is_some_and(|n| n == name))
            .map(|(_, outcome)| *outcome)
    }

    pub fn removed_directories(&self) -> usize {
        self.directories
            .iter()
            .filter(|(_, outcome)| *outcome == DirectoryOutcome::Removed)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Missing,
    Rejected,
    Canonical,
    Renamed,
    RenameFailed,
}

/// Walks a package tree and reconciles it with a [`PackageIndex`].
pub struct Sweeper<'a> {
    fs: &'a dyn FileSystem,
    reader: &'a dyn PackageReader,
    retry: RetryPolicy,
    feed_id: &'a str,
}

impl<'a> Sweeper<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        reader: &'a dyn PackageReader,
        retry: RetryPolicy,
        feed_id: &'a str,
    ) -> Self {
        Self {
            fs,
            reader,
            retry,
            feed_id,
        }
    }

    /// Sweep every package directory under `root`.
    pub fn sweep(&self, root: &Path, index: &mut dyn PackageIndex) -> SweepReport {
        let mut report = SweepReport::default();

        if !self.fs.dir_exists(root) {
            tracing::debug!(root = %root.display(), "Package root path not found. Nothing to do.");
            return report;
        }

        tracing::debug!(root = %root.display(), "Enumerating package directories");
        let directories = match self.fs.list_dirs(root) {
            Ok(directories) => directories,
            Err(e) => {
                tracing::error!(
                    root = %root.display(),
                    error = %e,
                    "Could not access root path. Skipping feed cleanup."
                );
                report.aborted = true;
                return report;
            }
        };

        for directory in directories {
            let outcome = self.sweep_directory(&directory, index, &mut report);
            report.directories.push((directory, outcome));
        }

        index.remove_remaining();

        tracing::info!(
            directories = report.directories.len(),
            inspected = report.inspected,
            renamed = report.renamed,
            failed = report.failed,
            removed = report.removed_directories(),
            "Feed cleanup finished"
        );
        report
    }

    fn sweep_directory(
        &self,
        directory: &Path,
        index: &mut dyn PackageIndex,
        report: &mut SweepReport,
    ) -> DirectoryOutcome {
        tracing::debug!(directory = %directory.display(), "Enumerating package files");
        let files = match self.fs.list_files(directory, PACKAGE_EXTENSION) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(
                    directory = %directory.display(),
                    error = %e,
                    "Could not list package files; leaving directory as is"
                );
                return DirectoryOutcome::Unreadable;
            }
        };

        if files.is_empty() {
            tracing::debug!(directory = %directory.display(), "Deleting empty directory");
            return match self.fs.remove_dir(directory) {
                Ok(()) => DirectoryOutcome::Removed,
                Err(e) => {
                    tracing::warn!(
                        directory = %directory.display(),
                        error = %e,
                        "Directory could not be deleted; it may not be empty"
                    );
                    DirectoryOutcome::RemovalFailed
                }
            };
        }

        let package_id = file_name_of(directory);
        for file in &files {
            report.inspected += 1;
            match self.inspect(directory, file, index) {
                Ok(FileOutcome::Missing) => report.missing += 1,
                Ok(FileOutcome::Rejected) => report.rejected += 1,
                Ok(FileOutcome::Canonical) => {}
                Ok(FileOutcome::Renamed) => report.renamed += 1,
                Ok(FileOutcome::RenameFailed) => report.rename_failures += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(path = %file.display(), error = %e, "Could not validate package");
                    index.report_error(&IndexingFailure {
                        feed_id: self.feed_id.to_string(),
                        package_id: package_id.clone(),
                        file_name: file_name_of(file),
                        message: e.to_string(),
                        details: diagnostic_details(&e),
                    });
                }
            }
        }

        DirectoryOutcome::Populated
    }

    fn inspect(
        &self,
        directory: &Path,
        file: &Path,
        index: &mut dyn PackageIndex,
    ) -> Result<FileOutcome> {
        let file_name = file_name_of(file);
        tracing::debug!(path = %file.display(), "Inspecting package");

        let Some(mut stream) =
            open_read_with_retry(self.fs, file, self.retry).map_err(|e| Error::io(file, e))?
        else {
            return Ok(FileOutcome::Missing);
        };

        tracing::debug!(file = %file_name, "Validating package");
        let valid = index
            .validate(&mut *stream)
            .map_err(|source| Error::Index { source })?;
        if !valid {
            tracing::debug!(file = %file_name, "Package rejected by index");
            return Ok(FileOutcome::Rejected);
        }

        stream
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(file, e))?;
        let identity = self.reader.read_identity(&mut *stream)?;
        let expected = identity.file_name();
        if file_name.to_lowercase() == expected.to_lowercase() {
            return Ok(FileOutcome::Canonical);
        }

        // Close before renaming; some shares refuse to move open files.
        drop(stream);
        tracing::warn!(file = %file_name, expected = %expected, "File has incorrect name");
        Ok(self.rename(file, &directory.join(&expected)))
    }

    fn rename(&self, source: &Path, target: &Path) -> FileOutcome {
        if self.fs.file_exists(target) {
            tracing::debug!(target = %target.display(), "Deleting target file");
            if let Err(e) = self.fs.remove_file(target) {
                tracing::error!(target = %target.display(), error = %e, "Could not delete target file");
            }
        }

        tracing::debug!(from = %source.display(), to = %target.display(), "Moving package");
        match self.fs.rename(source, target) {
            Ok(()) => {
                tracing::debug!("Package renamed");
                FileOutcome::Renamed
            }
            Err(e) => {
                tracing::error!(from = %source.display(), error = %e, "Could not rename package");
                FileOutcome::RenameFailed
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Cause chain of `err`, outermost first, one error per line.
fn diagnostic_details(err: &Error) -> Vec<u8> {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text.into_bytes()
}
