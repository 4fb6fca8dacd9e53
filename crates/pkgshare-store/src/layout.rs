//! On-disk layout of the package tree
//!
//! ```text
//! <root>/
//!   <id>/
//!     <id>.<version>.nupkg
//! ```

use crate::NormalizedPath;
use crate::identity::artifact_file_name;
use semver::Version;

/// Resolves package directories and artifact paths under a store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    root: NormalizedPath,
}

impl PackageLayout {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Directory holding every version of `id`.
    pub fn package_dir(&self, id: &str) -> NormalizedPath {
        self.root.join(id)
    }

    /// Full path of the artifact for `id` at `version`.
    pub fn artifact_path(&self, id: &str, version: &Version) -> NormalizedPath {
        self.package_dir(id).join(&artifact_file_name(id, version))
    }
}
