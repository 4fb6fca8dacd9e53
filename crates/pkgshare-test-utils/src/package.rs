//! Builders for `.nupkg` content.

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::FileOptions;

/// Minimal nuspec manifest declaring `id` at `version`.
pub fn nuspec_xml(id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <authors>pkgshare tests</authors>
    <description>Fixture package</description>
  </metadata>
</package>
"#
    )
}

/// A `.nupkg` archive whose manifest declares `id` at `version`.
pub fn nupkg_bytes(id: &str, version: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    zip.start_file(format!("{id}.nuspec"), options)
        .expect("start nuspec entry");
    zip.write_all(nuspec_xml(id, version).as_bytes())
        .expect("write nuspec entry");
    zip.start_file(format!("lib/net8.0/{id}.dll"), options)
        .expect("start payload entry");
    zip.write_all(b"MZ fixture payload")
        .expect("write payload entry");

    zip.finish().expect("finish archive").into_inner()
}
