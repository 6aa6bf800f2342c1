//! Removal of per-tile intermediate state.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::paths::TilePaths;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupResult {
    pub removed_archive: bool,
    pub removed_dir: bool,
}

/// Delete the tile's downloaded archive and extraction directory, if present.
pub fn remove_intermediate(paths: &TilePaths) -> Result<CleanupResult> {
    let removed_archive = remove_if_exists(&paths.archive, false)?;
    let removed_dir = remove_if_exists(&paths.extract_dir, true)?;

    if removed_archive || removed_dir {
        log_status!(
            "cleanup",
            "Removed {} and {}",
            paths.archive.display(),
            paths.extract_dir.display()
        );
    }

    Ok(CleanupResult {
        removed_archive,
        removed_dir,
    })
}

fn remove_if_exists(path: &Path, dir: bool) -> Result<bool> {
    let result = match (dir, path.exists()) {
        (_, false) => return Ok(false),
        (true, true) => fs::remove_dir_all(path),
        (false, true) => fs::remove_file(path),
    };

    result
        .map(|_| true)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("remove {}", path.display()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn removes_archive_and_directory() {
        let dir = TempDir::new().unwrap();
        let paths = TilePaths::new(dir.path(), "tt_um_micro1");
        fs::write(&paths.archive, b"zip").unwrap();
        fs::create_dir_all(paths.extract_dir.join("tt_submission")).unwrap();
        fs::write(paths.extract_dir.join("tt_submission/tile.gds"), b"gds").unwrap();
        fs::write(&paths.gds, b"final").unwrap();

        let result = remove_intermediate(&paths).unwrap();

        assert!(result.removed_archive);
        assert!(result.removed_dir);
        assert!(!paths.archive.exists());
        assert!(!paths.extract_dir.exists());
        assert!(paths.gds.exists());
    }

    #[test]
    fn nothing_to_remove_is_fine() {
        let dir = TempDir::new().unwrap();
        let paths = TilePaths::new(dir.path(), "tt_um_micro2");

        let result = remove_intermediate(&paths).unwrap();
        assert!(!result.removed_archive);
        assert!(!result.removed_dir);
    }
}
