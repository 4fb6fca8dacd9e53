//! Get, push and delete commands

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use pkgshare_store::{Error, NupkgReader, PackageIdentity, PackageReader, PackageStore};

use crate::error::{CliError, Result};

/// Copy a stored package to `output`, or to its canonical file name.
pub fn run_get(
    store: &PackageStore,
    id: &str,
    version: &str,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let identity = PackageIdentity::parse(id, version)?;
    let Some(mut stream) = store.open(&identity.id, &identity.version)? else {
        return Err(CliError::user(format!("Package {identity} not found")));
    };

    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(identity.file_name()));
    let mut file = File::create(&target).map_err(|e| Error::io(&target, e))?;
    let bytes = io::copy(&mut stream, &mut file)?;
    file.flush()?;

    println!(
        "{} {} -> {} ({} bytes)",
        "OK".green().bold(),
        identity,
        target.display(),
        bytes
    );
    Ok(target)
}

/// Store `file` under the identity its manifest declares.
pub fn run_push(store: &PackageStore, file: &Path) -> Result<PackageIdentity> {
    let mut source = File::open(file).map_err(|e| Error::io(file, e))?;
    let identity = NupkgReader::new().read_identity(&mut source)?;
    source.seek(SeekFrom::Start(0))?;

    let mut target = store.create(&identity.id, &identity.version)?;
    let bytes = io::copy(&mut source, &mut target)?;
    target.flush()?;
    drop(target);

    tracing::info!(%identity, bytes, "Package stored");
    println!("{} Stored {} ({} bytes)", "OK".green().bold(), identity, bytes);
    Ok(identity)
}

/// Delete a stored package.
pub fn run_delete(store: &PackageStore, id: &str, version: &str) -> Result<()> {
    let identity = PackageIdentity::parse(id, version)?;
    store.delete(&identity.id, &identity.version)?;

    println!("{} Deleted {}", "OK".green().bold(), identity);
    Ok(())
}
