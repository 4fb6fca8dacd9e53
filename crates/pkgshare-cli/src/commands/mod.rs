//! Command implementations for pkgshare-cli

pub mod check;
pub mod clean;
pub mod init;
pub mod package;

pub use check::run_check;
pub use clean::run_clean;
pub use init::run_init;
pub use package::{run_delete, run_get, run_push};

use crate::error::{CliError, Result};
use pkgshare_store::{ConfigStore, NormalizedPath, StoreConfig};
use std::path::Path;

/// Load the store configuration named by `--config`.
pub fn load_config(path: &Path) -> Result<StoreConfig> {
    let config_path = NormalizedPath::new(path);
    if !config_path.to_native().is_file() {
        return Err(CliError::user(format!(
            "Configuration file {} not found; run `pkgshare init` to create one",
            path.display()
        )));
    }
    Ok(ConfigStore::new().load(&config_path)?)
}
