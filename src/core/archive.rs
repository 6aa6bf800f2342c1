//! ZIP extraction for downloaded artifacts.

use std::fs::{self, File};
use std::path::Path;

use crate::error::{Error, Result};

/// Extract `archive` into `dest`, creating it if needed. Returns the number of entries.
pub fn extract(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive)
        .map_err(|e| Error::archive_invalid(archive.display().to_string(), e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::archive_invalid(archive.display().to_string(), e.to_string()))?;

    fs::create_dir_all(dest).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("create {}", dest.display())))
    })?;

    let entries = zip.len();
    zip.extract(dest)
        .map_err(|e| Error::archive_invalid(archive.display().to_string(), e.to_string()))?;

    log_status!("extract", "Unzipped artifact to {}", dest.display());
    Ok(entries)
}
