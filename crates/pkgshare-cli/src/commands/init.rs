//! Init command implementation

use std::path::Path;

use colored::Colorize;
use pkgshare_store::{ConfigStore, NormalizedPath, StoreConfig};

use crate::error::{CliError, Result};

/// Write a template configuration to `path`.
pub fn run_init(path: &Path, force: bool) -> Result<()> {
    let target = NormalizedPath::new(path);
    if target.to_native().exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    ConfigStore::new().save(&target, &StoreConfig::template())?;

    println!("{} Wrote {}", "OK".green().bold(), path.display());
    println!(
        "Set {}, {} and {}, then run {}.",
        "user_name".cyan(),
        "access_key".cyan(),
        "file_share_name".cyan(),
        "pkgshare check".cyan()
    );
    Ok(())
}
