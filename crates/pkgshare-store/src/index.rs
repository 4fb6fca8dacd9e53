//! The authoritative package index, as seen from the store
//!
//! The index is owned by the host. The sweep only asks it whether an
//! artifact is valid, tells it about artifacts that could not be
//! processed, and signals when the walk is finished.

use crate::IndexError;
use crate::fs::PackageRead;

/// Details of an artifact the sweep could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingFailure {
    /// Feed the store serves.
    pub feed_id: String,
    /// Package directory the artifact was found in.
    pub package_id: String,
    /// On-disk file name of the artifact.
    pub file_name: String,
    pub message: String,
    /// Serialized diagnostic trace: the error's cause chain, then a backtrace when one was captured.
    pub details: Vec<u8>,
}

/// Collaborator consulted and updated by the sweep.
pub trait PackageIndex {
    /// Decide whether the package in `package` belongs in the feed.
    fn validate(&mut self, package: &mut dyn PackageRead) -> Result<bool, IndexError>;

    /// Record an artifact the sweep failed on.
    fn report_error(&mut self, failure: &IndexingFailure);

    /// The sweep is complete; entries it did not touch are orphaned.
    fn remove_remaining(&mut self);
}
