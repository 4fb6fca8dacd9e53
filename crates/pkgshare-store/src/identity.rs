//! Package identity: the (id, version) pair an artifact is stored under.

use crate::{Error, Result};
use semver::Version;

/// File extension of stored artifacts.
pub const PACKAGE_EXTENSION: &str = "nupkg";

/// The identity of one stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub id: String,
    pub version: Version,
}

impl PackageIdentity {
    /// Build an identity from host-supplied strings.
    ///
    /// A blank id or version is reported as [`Error::MissingArgument`]; a
    /// version that does not parse is [`Error::InvalidVersion`].
    pub fn parse(id: &str, version: &str) -> Result<Self> {
        validate_package_id(id)?;
        if version.trim().is_empty() {
            return Err(Error::MissingArgument {
                name: "packageVersion",
            });
        }
        Ok(Self {
            id: id.to_string(),
            version: parse_version(version)?,
        })
    }

    /// Canonical on-disk file name: `<id>.<version>.nupkg`.
    pub fn file_name(&self) -> String {
        artifact_file_name(&self.id, &self.version)
    }
}

impl std::fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// Canonical file name for `id` at `version`.
pub fn artifact_file_name(id: &str, version: &Version) -> String {
    format!("{id}.{version}.{PACKAGE_EXTENSION}")
}

/// Check that a package id can name a directory under the store root.
pub fn validate_package_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::MissingArgument { name: "packageId" });
    }
    let reason = if id.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if id == "." || id == ".." {
        Some("must not be a relative path component")
    } else if id.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::InvalidArgument {
            name: "packageId",
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Parse a package version in its NuGet normalized form.
///
/// - `"1.2.3"` -> `1.2.3`
/// - `"1.2"` -> `1.2.0`
/// - `"1.2.3.0"` -> `1.2.3`
/// - `"1.2.3.4"`, `"1"` -> error
///
/// A non-zero fourth component has no semantic version equivalent.
pub fn parse_version(s: &str) -> Result<Version> {
    let s = s.trim();
    let (core, suffix) = s.split_at(s.find(['-', '+']).unwrap_or(s.len()));

    let parts: Vec<&str> = core.split('.').collect();
    let normalized = match parts.as_slice() {
        [major, minor] => format!("{major}.{minor}.0{suffix}"),
        [major, minor, patch, revision] if revision.parse::<u64>() == Ok(0) => {
            format!("{major}.{minor}.{patch}{suffix}")
        }
        _ => s.to_string(),
    };

    Version::parse(&normalized).map_err(|source| Error::InvalidVersion {
        version: s.to_string(),
        source,
    })
}
