//! Share paths in one separator style
//!
//! Roots are configured in Windows form (`P:\ProGetPackages`) but the
//! layout builds paths by joining segments. Everything is kept with `/`
//! and converted to a native [`PathBuf`] only when it reaches the
//! filesystem.

use std::path::{Path, PathBuf};

/// A path with `/` separators and no trailing separator.
///
/// A bare drive root keeps its separator, so `P:\` stays `P:/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut inner: String = path
            .as_ref()
            .to_string_lossy()
            .chars()
            .map(|c| if c == '\\' { '/' } else { c })
            .collect();
        while inner.len() > 1 && inner.ends_with('/') && !inner.ends_with(":/") {
            inner.pop();
        }
        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Native form for I/O.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Append one segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let separator = if self.inner.ends_with('/') { "" } else { "/" };
        Self {
            inner: format!("{}{separator}{segment}", self.inner),
        }
    }

    /// Last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self.inner.rsplit_once('/') {
            Some((_, name)) => Some(name).filter(|n| !n.is_empty()),
            None => Some(self.inner.as_str()).filter(|n| !n.is_empty()),
        }
    }

    /// Whether the path begins with `prefix`, comparing ASCII case-insensitively.
    ///
    /// Used to check that a root lies on the configured drive.
    pub fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        let prefix = NormalizedPath::new(prefix);
        self.inner
            .get(..prefix.inner.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&prefix.inner))
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
