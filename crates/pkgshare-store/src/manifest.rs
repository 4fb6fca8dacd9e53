//! Reading the identity a package declares about itself
//!
//! A `.nupkg` is a zip archive with a `.nuspec` XML manifest at its root.
//! The manifest's `metadata/id` and `metadata/version` decide the file name
//! the artifact must be stored under.

use crate::fs::PackageRead;
use crate::identity::{PackageIdentity, parse_version, validate_package_id};
use crate::{Error, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::Read;

/// Extracts the declared identity from package content.
pub trait PackageReader: Send + Sync {
    fn read_identity(&self, stream: &mut dyn PackageRead) -> Result<PackageIdentity>;
}

/// [`PackageReader`] for NuGet `.nupkg` archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct NupkgReader;

impl NupkgReader {
    pub fn new() -> Self {
        Self
    }
}

impl PackageReader for NupkgReader {
    fn read_identity(&self, stream: &mut dyn PackageRead) -> Result<PackageIdentity> {
        let nuspec = read_nuspec(stream)?;
        parse_nuspec(&nuspec)
    }
}

fn read_nuspec(stream: &mut dyn PackageRead) -> Result<String> {
    let mut archive = zip::ZipArchive::new(stream)
        .map_err(|e| Error::manifest(format!("not a package archive: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::manifest(format!("unreadable archive entry: {e}")))?;
        let name = entry.name();
        if name.contains('/') || !name.to_ascii_lowercase().ends_with(".nuspec") {
            continue;
        }
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| Error::manifest(format!("unreadable manifest: {e}")))?;
        return Ok(content);
    }

    Err(Error::manifest("archive has no .nuspec manifest"))
}

/// Parse `metadata/id` and `metadata/version` from nuspec XML.
///
/// Element names are matched without their namespace, since the nuspec
/// schema namespace differs between NuGet releases.
pub fn parse_nuspec(xml: &str) -> Result<PackageIdentity> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut id = None;
    let mut version = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::manifest(format!("bad manifest text: {e}")))?;
                record(&stack, &text, &mut id, &mut version);
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                record(&stack, &text, &mut id, &mut version);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::manifest(format!("malformed manifest XML: {e}"))),
        }
    }

    let id = id.ok_or_else(|| Error::manifest("manifest has no metadata/id"))?;
    let version = version.ok_or_else(|| Error::manifest("manifest has no metadata/version"))?;
    validate_package_id(&id).map_err(|e| Error::manifest(e.to_string()))?;

    Ok(PackageIdentity {
        id,
        version: parse_version(&version)?,
    })
}

fn record(stack: &[String], text: &str, id: &mut Option<String>, version: &mut Option<String>) {
    let [.., parent, field] = stack else {
        return;
    };
    if parent != "metadata" {
        return;
    }
    let slot = match field.as_str() {
        "id" => id,
        "version" => version,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(text.trim().to_string());
    }
}
