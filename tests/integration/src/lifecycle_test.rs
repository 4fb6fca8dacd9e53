//! End-to-end feed scenarios
//!
//! Each test drives a store built from an on-disk configuration through a
//! sequence of host calls, with the share simulated in memory.

use pkgshare_store::{ConfigStore, NormalizedPath, PackageRead, PackageStore, StoreConfig};
use pkgshare_test_utils::{
    FakeConnector, MemoryFileSystem, RecordingIndex, TEST_ROOT, nupkg_bytes, test_config,
};
use pretty_assertions::assert_eq;
use semver::Version;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

struct Feed {
    store: PackageStore,
    fs: MemoryFileSystem,
    connector: FakeConnector,
    _config_dir: TempDir,
}

impl Feed {
    /// Persist the test configuration, load it back, and build a store on it.
    fn from_saved_config() -> Self {
        let config_dir = TempDir::new().unwrap();
        let path = NormalizedPath::new(config_dir.path().join("pkgshare.toml"));
        let configs = ConfigStore::new();
        configs.save(&path, &test_config()).unwrap();
        let config: StoreConfig = configs.load(&path).unwrap();

        let fs = MemoryFileSystem::new();
        let connector = FakeConnector::disconnected();
        let store = PackageStore::new(&config, fs.clone(), connector.clone()).unwrap();
        Self {
            store,
            fs,
            connector,
            _config_dir: config_dir,
        }
    }

    fn push(&self, id: &str, version: &str) -> Vec<u8> {
        let content = nupkg_bytes(id, version);
        let mut stream = self
            .store
            .create(id, &Version::parse(version).unwrap())
            .unwrap();
        stream.write_all(&content).unwrap();
        content
    }

    fn fetch(&self, id: &str, version: &str) -> Option<Vec<u8>> {
        self.store
            .open(id, &Version::parse(version).unwrap())
            .unwrap()
            .map(read_all)
    }

    fn path(&self, relative: &str) -> String {
        format!("{TEST_ROOT}/{relative}")
    }
}

fn read_all(mut stream: Box<dyn PackageRead>) -> Vec<u8> {
    let mut content = Vec::new();
    stream.read_to_end(&mut content).unwrap();
    content
}

#[test]
fn test_feed_lifecycle() {
    let feed = Feed::from_saved_config();

    let a1 = feed.push("pkgA", "1.0.0");
    let a2 = feed.push("pkgA", "2.0.0");
    feed.push("pkgB", "1.0.0");

    // Copied onto the share by hand, under the wrong name
    let b11 = nupkg_bytes("pkgB", "1.1.0");
    feed.fs.add_file(feed.path("pkgB/upload.nupkg"), &b11);
    feed.fs.add_dir(feed.path("abandoned"));

    assert_eq!(feed.fetch("pkgA", "1.0.0"), Some(a1));
    assert_eq!(feed.fetch("pkgA", "2.0.0"), Some(a2));
    assert_eq!(feed.fetch("pkgB", "1.1.0"), None);

    let mut index = RecordingIndex::new();
    let report = feed.store.clean(&mut index).unwrap();

    assert_eq!(report.inspected, 4);
    assert_eq!(report.renamed, 1);
    assert_eq!(report.removed_directories(), 1);
    assert!(index.failures.is_empty());
    assert_eq!(feed.fetch("pkgB", "1.1.0"), Some(b11));

    feed.store.delete("pkgA", &Version::new(1, 0, 0)).unwrap();
    feed.store.delete("pkgA", &Version::new(2, 0, 0)).unwrap();

    assert!(!feed.fs.contains_dir(feed.path("pkgA")));
    assert_eq!(
        feed.fs.file_names(feed.path("pkgB")),
        vec!["pkgB.1.0.0.nupkg", "pkgB.1.1.0.nupkg"]
    );
    assert_eq!(feed.connector.connect_count(), 1);
}

#[test]
fn test_dropped_share_is_remapped_on_next_call() {
    let feed = Feed::from_saved_config();
    let content = feed.push("pkgA", "1.0.0");

    feed.connector.drop_connection();

    assert_eq!(feed.fetch("pkgA", "1.0.0"), Some(content));
    assert_eq!(feed.connector.connect_count(), 2);
}

#[test]
fn test_parallel_writers_then_readers() {
    const PACKAGES: usize = 6;

    let feed = Feed::from_saved_config();
    let store = Arc::new(feed.store);

    let writers: Vec<_> = (0..PACKAGES)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let id = format!("pkg{i}");
                let mut stream = store.create(&id, &Version::new(1, 0, 0)).unwrap();
                stream.write_all(&nupkg_bytes(&id, "1.0.0")).unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let readers: Vec<_> = (0..PACKAGES)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let id = format!("pkg{i}");
                let stream = store.open(&id, &Version::new(1, 0, 0)).unwrap().unwrap();
                (id, read_all(stream))
            })
        })
        .collect();
    for reader in readers {
        let (id, content) = reader.join().unwrap();
        assert_eq!(content, nupkg_bytes(&id, "1.0.0"));
    }

    assert_eq!(feed.connector.connect_count(), 1);
}

#[test]
fn test_sweep_over_flaky_share() {
    let feed = Feed::from_saved_config();
    feed.push("stable", "1.0.0");
    feed.fs
        .add_file(feed.path("flaky/flaky.nupkg"), &nupkg_bytes("flaky", "2.0.0"));
    feed.fs
        .add_file(feed.path("locked/locked.1.0.0.nupkg"), &nupkg_bytes("locked", "1.0.0"));

    // Recovers within the three configured attempts
    feed.fs.fail_opens(
        feed.path("flaky/flaky.nupkg"),
        [io::ErrorKind::TimedOut, io::ErrorKind::ConnectionReset],
    );
    // Never recovers
    feed.fs.fail_opens(
        feed.path("locked/locked.1.0.0.nupkg"),
        [io::ErrorKind::PermissionDenied; 3],
    );

    let mut index = RecordingIndex::new();
    let report = feed.store.clean(&mut index).unwrap();

    assert_eq!(index.failed_files(), vec!["locked.1.0.0.nupkg"]);
    assert_eq!(index.failures[0].package_id, "locked");
    assert_eq!(index.failures[0].feed_id, "feed-1");
    assert_eq!(
        feed.fs.file_names(feed.path("flaky")),
        vec!["flaky.2.0.0.nupkg"]
    );
    assert_eq!(report.renamed, 1);
    assert_eq!(index.remove_remaining_calls, 1);
    assert!(feed.fs.contains_file(feed.path("locked/locked.1.0.0.nupkg")));
}
