//! Reading `.tar.gz` archives of charts and manifests

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::error::{CoreError, Result};
use crate::manifest::{Manifest, Manifests};

/// A regular file read from an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path inside the archive
    pub path: String,
    /// File contents
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    /// File contents as UTF-8 text
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.content).map_err(|e| CoreError::Archive {
            message: format!("{} is not valid UTF-8: {}", self.path, e),
        })
    }
}

/// Read every regular file of an archive, in archive order
pub fn read_entries(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(archive_path).map_err(|e| CoreError::Archive {
        message: format!("failed to open {}: {}", archive_path.display(), e),
    })?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.to_string_lossy().to_string();
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;

        entries.push(ArchiveEntry { path, content });
    }

    Ok(entries)
}

/// Read all YAML files of a manifests archive as manifests
pub fn read_manifests(archive_path: &Path) -> Result<Manifests> {
    let mut manifests = Manifests::new();

    for entry in read_entries(archive_path)? {
        if !is_yaml_path(&entry.path) {
            continue;
        }
        let content = entry.text()?.to_string();
        manifests.push(Manifest::new(entry.path, content));
    }

    Ok(manifests)
}

/// True for `.yaml` / `.yml` paths
pub fn is_yaml_path(path: &str) -> bool {
    path.ends_with(".yaml") || path.ends_with(".yml")
}
