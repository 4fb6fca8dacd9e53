//! Clean command implementation

use colored::Colorize;
use pkgshare_store::{
    IndexError, IndexingFailure, NupkgReader, PackageIndex, PackageRead, PackageReader,
    PackageStore, SweepReport,
};

use crate::error::{CliError, Result};

/// Index that accepts any package whose manifest can be read.
///
/// It has no storage of its own, so there is nothing to retire when the
/// sweep finishes; failures are kept for the summary.
#[derive(Debug, Default)]
pub struct ManifestIndex {
    reader: NupkgReader,
    pub valid: usize,
    pub failures: Vec<IndexingFailure>,
}

impl ManifestIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PackageIndex for ManifestIndex {
    fn validate(&mut self, package: &mut dyn PackageRead) -> std::result::Result<bool, IndexError> {
        let identity = self.reader.read_identity(package)?;
        tracing::debug!(%identity, "Package manifest is readable");
        self.valid += 1;
        Ok(true)
    }

    fn report_error(&mut self, failure: &IndexingFailure) {
        self.failures.push(failure.clone());
    }

    fn remove_remaining(&mut self) {
        tracing::debug!(valid = self.valid, "Sweep finished; no index entries to retire");
    }
}

/// Run the sweep and print what it did.
pub fn run_clean(store: &PackageStore) -> Result<SweepReport> {
    let mut index = ManifestIndex::new();
    let report = store.clean(&mut index)?;

    print_report(&report, &index);

    if report.aborted {
        return Err(CliError::user(format!(
            "Could not list {}; nothing was cleaned",
            store.layout().root()
        )));
    }
    if !index.failures.is_empty() {
        return Err(CliError::user(format!(
            "{} package(s) failed validation",
            index.failures.len()
        )));
    }
    Ok(report)
}

fn print_report(report: &SweepReport, index: &ManifestIndex) {
    println!("{}", "Feed cleanup".bold());
    println!();
    println!("{}:  {}", "Directories".dimmed(), report.directories.len());
    println!("{}:     {}", "Packages".dimmed(), report.inspected);
    println!("{}:        {}", "Valid".dimmed(), index.valid);
    println!("{}:      {}", "Renamed".dimmed(), report.renamed);
    println!("{}:      {}", "Removed".dimmed(), report.removed_directories());
    if report.missing > 0 {
        println!("{}:    {}", "Vanished".dimmed(), report.missing);
    }
    if report.rename_failures > 0 {
        println!(
            "{}: {}",
            "Not renamed".dimmed(),
            report.rename_failures.to_string().yellow()
        );
    }

    if !index.failures.is_empty() {
        println!();
        println!("{}:", "Failures".bold());
        for failure in &index.failures {
            println!(
                "  {} {}/{}: {}",
                "x".red(),
                failure.package_id,
                failure.file_name.cyan(),
                failure.message
            );
        }
    }
}
