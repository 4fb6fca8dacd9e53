//! The package store the host framework talks to
//!
//! Each operation validates its arguments, makes sure the share is mapped,
//! and then works on the package tree through the [`FileSystem`] seam.

use crate::config::{StoreConfig, StoreSettings};
use crate::fs::{FileSystem, LocalFileSystem, PackageRead, PackageWrite};
use crate::identity::validate_package_id;
use crate::index::PackageIndex;
use crate::layout::PackageLayout;
use crate::manifest::{NupkgReader, PackageReader};
use crate::mount::{NetUseConnector, ShareConnector, ShareMount};
use crate::sweep::{SweepReport, Sweeper};
use crate::{Error, Result};
use semver::Version;
use std::io;
use std::time::Instant;

/// NuGet package store on a mapped file share.
pub struct PackageStore {
    settings: StoreSettings,
    layout: PackageLayout,
    mount: ShareMount,
    fs: Box<dyn FileSystem>,
    reader: Box<dyn PackageReader>,
}

impl PackageStore {
    /// Build a store over the real share, mapped with `net use`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(config, LocalFileSystem::new(), NetUseConnector::new())
    }

    /// Build a store over the given filesystem and share connector.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`StoreConfig::validate`]; nothing is
    /// touched on disk or on the network before validation passes.
    pub fn new(
        config: &StoreConfig,
        fs: impl FileSystem + 'static,
        connector: impl ShareConnector + 'static,
    ) -> Result<Self> {
        let settings = config.validate()?;
        Ok(Self::with_settings(settings, fs, connector))
    }

    pub fn with_settings(
        settings: StoreSettings,
        fs: impl FileSystem + 'static,
        connector: impl ShareConnector + 'static,
    ) -> Self {
        Self {
            layout: PackageLayout::new(settings.root.clone()),
            settings,
            mount: ShareMount::new(connector),
            fs: Box::new(fs),
            reader: Box::new(NupkgReader::new()),
        }
    }

    /// Replace the manifest reader used by [`PackageStore::clean`].
    pub fn with_reader(mut self, reader: impl PackageReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn layout(&self) -> &PackageLayout {
        &self.layout
    }

    /// Open a stored package for reading.
    ///
    /// Returns `Ok(None)` when the package directory or the artifact does not
    /// exist, including when it disappears between the check and the open.
    pub fn open(&self, id: &str, version: &Version) -> Result<Option<Box<dyn PackageRead>>> {
        validate_package_id(id)?;
        self.ensure_mounted()?;
        tracing::debug!(id, %version, "OpenPackage called");

        let package_dir = self.layout.package_dir(id).to_native();
        if !self.fs.dir_exists(&package_dir) {
            tracing::warn!(
                id,
                %version,
                directory = %package_dir.display(),
                "Attempted to open package but the folder didn't exist"
            );
            return Ok(None);
        }

        let artifact = self.layout.artifact_path(id, version).to_native();
        if !self.fs.file_exists(&artifact) {
            tracing::warn!(
                id,
                %version,
                path = %artifact.display(),
                "Attempted to open package but it didn't exist"
            );
            return Ok(None);
        }

        match self.fs.open_read(&artifact) {
            Ok(stream) => Ok(Some(stream)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!(id, %version, error = %e, "Package vanished while opening");
                Ok(None)
            }
            Err(e) => Err(Error::io(artifact, e)),
        }
    }

    /// Create (or overwrite) a package and return a stream to write it.
    pub fn create(&self, id: &str, version: &Version) -> Result<Box<dyn PackageWrite>> {
        validate_package_id(id)?;
        self.ensure_mounted()?;
        tracing::debug!(id, %version, "CreatePackage called");

        let package_dir = self.layout.package_dir(id).to_native();
        let artifact = self.layout.artifact_path(id, version).to_native();
        tracing::debug!(id, %version, path = %artifact.display(), "Creating package");

        let created = self
            .fs
            .create_dir_all(&package_dir)
            .map_err(|e| Error::io(&package_dir, e))
            .and_then(|()| {
                self.fs
                    .create_write(&artifact)
                    .map_err(|e| Error::io(&artifact, e))
            });
        if let Err(e) = &created {
            tracing::error!(id, %version, error = %e, "Error creating package");
        }
        created
    }

    /// Delete a package; the package directory goes too once it is empty.
    pub fn delete(&self, id: &str, version: &Version) -> Result<()> {
        validate_package_id(id)?;
        self.ensure_mounted()?;
        tracing::debug!(id, %version, "DeletePackage called");

        let package_dir = self.layout.package_dir(id).to_native();
        if !self.fs.dir_exists(&package_dir) {
            tracing::warn!(id, %version, "Attempted to delete package that didn't exist");
            return Ok(());
        }

        let artifact = self.layout.artifact_path(id, version).to_native();
        tracing::debug!(path = %artifact.display(), "Deleting file");
        match self.fs.remove_file(&artifact) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %artifact.display(), "Package file already gone");
            }
            Err(e) => {
                tracing::error!(id, %version, error = %e, "Error deleting package");
                return Err(Error::io(artifact, e));
            }
        }

        if matches!(self.fs.is_dir_empty(&package_dir), Ok(true)) {
            tracing::debug!(directory = %package_dir.display(), "Deleting folder");
            if let Err(e) = self.fs.remove_dir(&package_dir) {
                tracing::warn!(
                    directory = %package_dir.display(),
                    error = %e,
                    "Could not delete package folder"
                );
            }
        }
        Ok(())
    }

    /// Run the consistency check and repair sweep against `index`.
    ///
    /// Only a failure to map the share is returned as an error; problems
    /// found during the sweep are in the report and the index's error log.
    pub fn clean(&self, index: &mut dyn PackageIndex) -> Result<SweepReport> {
        self.ensure_mounted()?;
        tracing::debug!(root = %self.layout.root(), "Clean called");

        let sweeper = Sweeper::new(
            &*self.fs,
            &*self.reader,
            self.settings.retry,
            &self.settings.feed_id,
        );
        Ok(sweeper.sweep(&self.layout.root().to_native(), index))
    }

    fn ensure_mounted(&self) -> Result<()> {
        let started = Instant::now();
        self.mount.ensure_mounted(&self.settings.binding)?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Share mapping verified"
        );
        Ok(())
    }
}

impl std::fmt::Debug for PackageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
