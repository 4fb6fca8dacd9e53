//! Shared test fixtures for the pkgshare workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`fs`]: [`MemoryFileSystem`], an in-memory filesystem with failure injection
//! - [`share`]: [`FakeConnector`], a share that counts mounts
//! - [`index`]: [`RecordingIndex`], a package index that records sweep calls
//! - [`package`]: `.nupkg` builders

pub mod fs;
pub mod index;
pub mod package;
pub mod share;

pub use fs::MemoryFileSystem;
pub use index::RecordingIndex;
pub use package::{nupkg_bytes, nuspec_xml};
pub use share::FakeConnector;

use pkgshare_store::{RetrySettings, StoreConfig};

/// Store root used by [`test_config`], as the store resolves it natively.
pub const TEST_ROOT: &str = "P:/ProGetPackages";

/// A valid configuration with a short retry delay.
pub fn test_config() -> StoreConfig {
    StoreConfig {
        drive_letter: Some("P:".to_string()),
        root_path: Some(r"P:\ProGetPackages".to_string()),
        file_share_name: Some("filesharename".to_string()),
        user_name: Some("username".to_string()),
        access_key: Some("accesskey".to_string()),
        feed_id: Some("feed-1".to_string()),
        retry: RetrySettings {
            max_attempts: 3,
            delay_ms: 10,
        },
        ..StoreConfig::default()
    }
}
