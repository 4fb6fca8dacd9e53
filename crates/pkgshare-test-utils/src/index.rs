//! [`PackageIndex`] double that records what the sweep told it.

use pkgshare_store::{
    IndexError, IndexingFailure, NupkgReader, PackageIndex, PackageRead, PackageReader,
};
use std::io::Cursor;

type Verdict = Box<dyn FnMut(&[u8]) -> Result<bool, IndexError> + Send>;

/// Records validations, reported failures and end-of-sweep signals.
///
/// By default a package is valid when its manifest parses; content that is
/// not a package makes `validate` fail, the way a real index would.
pub struct RecordingIndex {
    verdict: Verdict,
    pub validated: usize,
    pub failures: Vec<IndexingFailure>,
    pub remove_remaining_calls: usize,
}

impl RecordingIndex {
    pub fn new() -> Self {
        Self::with_verdict(|content| {
            let mut stream = Cursor::new(content.to_vec());
            NupkgReader.read_identity(&mut stream)?;
            Ok(true)
        })
    }

    /// Accept every artifact without looking at it.
    pub fn accepting_all() -> Self {
        Self::with_verdict(|_| Ok(true))
    }

    /// Decide validity with `verdict`, given the artifact's bytes.
    pub fn with_verdict(
        verdict: impl FnMut(&[u8]) -> Result<bool, IndexError> + Send + 'static,
    ) -> Self {
        Self {
            verdict: Box::new(verdict),
            validated: 0,
            failures: Vec::new(),
            remove_remaining_calls: 0,
        }
    }

    /// File names passed to `report_error`, in order.
    pub fn failed_files(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.file_name.as_str()).collect()
    }
}

impl Default for RecordingIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageIndex for RecordingIndex {
    fn validate(&mut self, package: &mut dyn PackageRead) -> Result<bool, IndexError> {
        self.validated += 1;
        let mut content = Vec::new();
        package.read_to_end(&mut content)?;
        (self.verdict)(&content)
    }

    fn report_error(&mut self, failure: &IndexingFailure) {
        self.failures.push(failure.clone());
    }

    fn remove_remaining(&mut self) {
        self.remove_remaining_calls += 1;
    }
}
