//! NuGet package store on a mapped network file share
//!
//! Packages live at `<root>/<id>/<id>.<version>.nupkg` on a share that is
//! mapped to a local drive on first use. Besides open/create/delete, the
//! store runs a sweep that reconciles the tree with the host's package
//! index, renaming misnamed artifacts and removing empty directories.

pub mod config;
pub mod error;
pub mod fs;
pub mod identity;
pub mod index;
pub mod io;
pub mod layout;
pub mod manifest;
pub mod mount;
pub mod path;
pub mod retry;
pub mod store;
pub mod sweep;

pub use config::{ConfigStore, RetrySettings, StoreConfig, StoreSettings};
pub use error::{Error, IndexError, Result};
pub use fs::{FileSystem, LocalFileSystem, PackageRead, PackageWrite};
pub use identity::{PACKAGE_EXTENSION, PackageIdentity};
pub use index::{IndexingFailure, PackageIndex};
pub use layout::PackageLayout;
pub use manifest::{NupkgReader, PackageReader};
pub use mount::{NetUseConnector, ShareBinding, ShareConnector, ShareMount};
pub use path::NormalizedPath;
pub use retry::RetryPolicy;
pub use store::PackageStore;
pub use sweep::{DirectoryOutcome, SweepReport, Sweeper};
