//! Consistency sweep scenarios against an in-memory share

use pkgshare_store::{DirectoryOutcome, PackageStore, SweepReport};
use pkgshare_test_utils::{
    FakeConnector, MemoryFileSystem, RecordingIndex, TEST_ROOT, nupkg_bytes, test_config,
};
use pretty_assertions::assert_eq;
use std::io;

struct Feed {
    store: PackageStore,
    fs: MemoryFileSystem,
}

impl Feed {
    fn new() -> Self {
        let fs = MemoryFileSystem::new();
        let store =
            PackageStore::new(&test_config(), fs.clone(), FakeConnector::connected()).unwrap();
        Self { store, fs }
    }

    fn dir(&self, id: &str) -> String {
        format!("{TEST_ROOT}/{id}")
    }

    fn file(&self, id: &str, name: &str) -> String {
        format!("{TEST_ROOT}/{id}/{name}")
    }

    fn put(&self, id: &str, name: &str, content: &[u8]) {
        self.fs.add_file(self.file(id, name), content);
    }

    fn clean(&self, index: &mut RecordingIndex) -> SweepReport {
        self.store.clean(index).unwrap()
    }
}

#[test]
fn misnamed_artifact_is_renamed_to_its_manifest_identity() {
    let feed = Feed::new();
    feed.put("pkgA", "wrong.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["pkgA.1.0.0.nupkg"]);
    assert_eq!(report.renamed, 1);
    assert_eq!(report.outcome("pkgA"), Some(DirectoryOutcome::Populated));
    assert!(index.failures.is_empty());
    assert_eq!(index.remove_remaining_calls, 1);
}

#[test]
fn two_part_manifest_version_gets_canonical_name() {
    let feed = Feed::new();
    feed.put("pkgA", "pkgA.1.0.nupkg", &nupkg_bytes("pkgA", "1.0"));
    let mut index = RecordingIndex::new();

    feed.clean(&mut index);

    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["pkgA.1.0.0.nupkg"]);
}

#[test]
fn four_part_manifest_version_is_repaired() {
    let feed = Feed::new();
    let legacy = nupkg_bytes("legacy", "1.0.0.0");
    feed.put("legacy", "upload.nupkg", &legacy);
    let mut index = RecordingIndex::accepting_all();

    let report = feed.clean(&mut index);

    assert!(index.failures.is_empty(), "{:?}", index.failures);
    assert_eq!(report.renamed, 1);
    assert_eq!(feed.fs.file_names(feed.dir("legacy")), vec!["legacy.1.0.0.nupkg"]);
    assert_eq!(feed.fs.read(feed.file("legacy", "legacy.1.0.0.nupkg")), Some(legacy));
}

#[test]
fn nonzero_revision_is_reported_and_left_in_place() {
    let feed = Feed::new();
    feed.put("legacy", "upload.nupkg", &nupkg_bytes("legacy", "1.2.3.4"));
    let mut index = RecordingIndex::accepting_all();

    let report = feed.clean(&mut index);

    assert_eq!(report.renamed, 0);
    assert_eq!(index.failed_files(), vec!["upload.nupkg"]);
    assert!(index.failures[0].message.contains("'1.2.3.4'"));
    assert_eq!(feed.fs.file_names(feed.dir("legacy")), vec!["upload.nupkg"]);
}

#[test]
fn name_differing_only_in_case_is_left_alone() {
    let feed = Feed::new();
    feed.put("pkgA", "PKGA.1.0.0.NUPKG", &nupkg_bytes("pkgA", "1.0.0"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["PKGA.1.0.0.NUPKG"]);
    assert_eq!(report.inspected, 1);
    assert_eq!(report.renamed, 0);
}

#[test]
fn existing_target_is_replaced_by_renamed_artifact() {
    let feed = Feed::new();
    let misnamed = nupkg_bytes("pkgA", "1.0.0");
    feed.put("pkgA", "pkgA.1.0.0.nupkg", b"stale copy");
    feed.put("pkgA", "zz-upload.nupkg", &misnamed);
    let mut index = RecordingIndex::accepting_all();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["pkgA.1.0.0.nupkg"]);
    assert_eq!(feed.fs.read(feed.file("pkgA", "pkgA.1.0.0.nupkg")), Some(misnamed));
    assert_eq!(report.renamed, 1);
    assert_eq!(
        index.failed_files(),
        vec!["pkgA.1.0.0.nupkg"],
        "the stale copy is not a package and is reported on its own"
    );
}

#[test]
fn target_removal_failure_still_attempts_rename() {
    let feed = Feed::new();
    feed.put("pkgA", "pkgA.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.put("pkgA", "upload.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.fail_removal(feed.file("pkgA", "pkgA.1.0.0.nupkg"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(report.renamed, 1);
    assert!(!feed.fs.contains_file(feed.file("pkgA", "upload.nupkg")));
}

#[test]
fn rename_failure_leaves_file_in_place() {
    let feed = Feed::new();
    feed.put("pkgA", "wrong.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.fail_rename(feed.file("pkgA", "wrong.1.0.0.nupkg"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["wrong.1.0.0.nupkg"]);
    assert_eq!(report.rename_failures, 1);
    assert!(index.failures.is_empty(), "rename problems are logged, not indexed");
    assert_eq!(index.remove_remaining_calls, 1);
}

#[test]
fn rejected_artifact_is_not_renamed() {
    let feed = Feed::new();
    feed.put("pkgA", "wrong.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    let mut index = RecordingIndex::with_verdict(|_| Ok(false));

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["wrong.1.0.0.nupkg"]);
    assert_eq!(report.rejected, 1);
    assert!(index.failures.is_empty());
}

#[test]
fn directory_without_artifacts_is_removed() {
    let feed = Feed::new();
    feed.fs.add_dir(feed.dir("emptyPkg"));
    feed.put("pkgA", "pkgA.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert!(!feed.fs.contains_dir(feed.dir("emptyPkg")));
    assert_eq!(report.outcome("emptyPkg"), Some(DirectoryOutcome::Removed));
    assert_eq!(report.outcome("pkgA"), Some(DirectoryOutcome::Populated));
    assert_eq!(index.validated, 1);
}

#[test]
fn directory_with_only_other_files_cannot_be_removed() {
    let feed = Feed::new();
    feed.put("notes", "readme.txt", b"not a package");
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(report.outcome("notes"), Some(DirectoryOutcome::RemovalFailed));
    assert!(feed.fs.contains_file(feed.file("notes", "readme.txt")));
    assert_eq!(index.validated, 0);
    assert_eq!(index.remove_remaining_calls, 1);
}

#[test]
fn one_bad_artifact_does_not_stop_its_siblings() {
    let feed = Feed::new();
    feed.put("pkgB", "pkgB.1.0.0.nupkg", b"this is not a zip archive");
    feed.put("pkgB", "pkgB.2.0.0.nupkg", &nupkg_bytes("pkgB", "2.0.0"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(index.validated, 2);
    assert_eq!(index.failed_files(), vec!["pkgB.1.0.0.nupkg"]);
    let failure = &index.failures[0];
    assert_eq!(failure.feed_id, "feed-1");
    assert_eq!(failure.package_id, "pkgB");
    assert!(!failure.message.is_empty());
    assert!(!failure.details.is_empty());
    assert_eq!(report.failed, 1);
    assert_eq!(index.remove_remaining_calls, 1);
}

#[test]
fn failures_in_one_directory_do_not_stop_the_next() {
    let feed = Feed::new();
    feed.put("aaa", "aaa.1.0.0.nupkg", b"garbage");
    feed.put("zzz", "wrong.nupkg", &nupkg_bytes("zzz", "3.1.4"));
    let mut index = RecordingIndex::new();

    feed.clean(&mut index);

    assert_eq!(index.failed_files(), vec!["aaa.1.0.0.nupkg"]);
    assert_eq!(feed.fs.file_names(feed.dir("zzz")), vec!["zzz.3.1.4.nupkg"]);
}

#[test]
fn index_errors_are_reported_with_their_message() {
    let feed = Feed::new();
    feed.put("pkgA", "pkgA.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    let mut index = RecordingIndex::with_verdict(|_| Err("index database is locked".into()));

    let report = feed.clean(&mut index);

    assert_eq!(report.failed, 1);
    assert!(index.failures[0].message.contains("index database is locked"));
}

#[test]
fn missing_root_ends_quietly() {
    let feed = Feed::new();
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(report, SweepReport::default());
    assert_eq!(index.remove_remaining_calls, 0);
}

#[test]
fn unlistable_root_aborts_without_finalizing_index() {
    let feed = Feed::new();
    feed.put("pkgA", "pkgA.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.fail_listing(TEST_ROOT);
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert!(report.aborted);
    assert!(report.directories.is_empty());
    assert_eq!(index.validated, 0);
    assert_eq!(index.remove_remaining_calls, 0);
}

#[test]
fn unlistable_package_directory_is_skipped() {
    let feed = Feed::new();
    feed.put("locked", "locked.1.0.0.nupkg", &nupkg_bytes("locked", "1.0.0"));
    feed.put("pkgA", "wrong.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.fail_listing(feed.dir("locked"));
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(report.outcome("locked"), Some(DirectoryOutcome::Unreadable));
    assert!(feed.fs.contains_dir(feed.dir("locked")));
    assert_eq!(feed.fs.file_names(feed.dir("pkgA")), vec!["pkgA.1.0.0.nupkg"]);
    assert_eq!(index.remove_remaining_calls, 1);
}

#[test]
fn transient_open_failures_are_retried() {
    let feed = Feed::new();
    let path = feed.file("pkgA", "wrong.1.0.0.nupkg");
    feed.put("pkgA", "wrong.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs
        .fail_opens(&path, [io::ErrorKind::TimedOut, io::ErrorKind::PermissionDenied]);
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.open_attempts(&path), 3);
    assert_eq!(report.renamed, 1);
    assert!(index.failures.is_empty());
}

#[test]
fn exhausted_retries_are_reported_to_index() {
    let feed = Feed::new();
    let path = feed.file("pkgA", "pkgA.1.0.0.nupkg");
    feed.put("pkgA", "pkgA.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.fail_opens(&path, [io::ErrorKind::TimedOut; 5]);
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.open_attempts(&path), 3, "configured for three attempts");
    assert_eq!(index.validated, 0);
    assert_eq!(index.failed_files(), vec!["pkgA.1.0.0.nupkg"]);
    assert_eq!(report.failed, 1);
    assert!(feed.fs.contains_file(&path));
}

#[test]
fn artifact_vanishing_before_open_is_skipped() {
    let feed = Feed::new();
    let path = feed.file("pkgA", "pkgA.1.0.0.nupkg");
    feed.put("pkgA", "pkgA.1.0.0.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.fail_opens(&path, [io::ErrorKind::NotFound]);
    let mut index = RecordingIndex::new();

    let report = feed.clean(&mut index);

    assert_eq!(feed.fs.open_attempts(&path), 1);
    assert_eq!(report.missing, 1);
    assert_eq!(index.validated, 0);
    assert!(index.failures.is_empty());
    assert_eq!(report.outcome("pkgA"), Some(DirectoryOutcome::Populated));
}

#[test]
fn second_sweep_finds_nothing_to_repair() {
    let feed = Feed::new();
    feed.put("pkgA", "wrong.nupkg", &nupkg_bytes("pkgA", "1.0.0"));
    feed.fs.add_dir(feed.dir("empty"));

    let first = feed.clean(&mut RecordingIndex::new());
    let second = feed.clean(&mut RecordingIndex::new());

    assert_eq!(first.renamed, 1);
    assert_eq!(first.removed_directories(), 1);
    assert_eq!(second.renamed, 0);
    assert_eq!(second.removed_directories(), 0);
    assert_eq!(second.directories.len(), 1);
}
