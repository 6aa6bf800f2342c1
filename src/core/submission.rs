//! Locate the design files inside an extracted submission artifact.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// The three design files a submission must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionFiles {
    pub gds: PathBuf,
    pub lef: PathBuf,
    pub verilog: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Search `<extract_dir>/<artifact_name>/` (or `extract_dir` itself when that
/// folder is absent) for one `.gds`, `.lef` and `.v` file.
pub fn locate(extract_dir: &Path, artifact_name: &str) -> Result<SubmissionFiles> {
    let nested = extract_dir.join(artifact_name);
    let search_dir = if nested.is_dir() {
        nested
    } else {
        extract_dir.to_path_buf()
    };

    let mut warnings = Vec::new();
    let gds = find_one(&search_dir, "gds", &mut warnings)?;
    let lef = find_one(&search_dir, "lef", &mut warnings)?;
    let verilog = find_one(&search_dir, "v", &mut warnings)?;

    Ok(SubmissionFiles {
        gds,
        lef,
        verilog,
        warnings,
    })
}

fn find_one(dir: &Path, extension: &str, warnings: &mut Vec<String>) -> Result<PathBuf> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/*.{}", escaped, extension);

    // glob yields paths in alphabetical order
    let matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| {
            Error::internal_unexpected(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    let first = matches
        .first()
        .cloned()
        .ok_or_else(|| Error::archive_missing_file(dir.display().to_string(), extension))?;

    log_status!("select", "Found relevant file: {}", first.display());
    if matches.len() > 1 {
        let warning = format!(
            "{} .{} files found; using {}",
            matches.len(),
            extension,
            first.display()
        );
        log_status!("select", "Warning: {}", warning);
        warnings.push(warning);
    }

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).unwrap();
    }

    #[test]
    fn prefers_artifact_subdirectory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("tt_submission");
        fs::create_dir(&nested).unwrap();
        for name in ["tile.gds", "tile.lef", "tile.v", "tile.oas", "stats.csv"] {
            touch(&nested, name);
        }
        touch(dir.path(), "decoy.gds");

        let files = locate(dir.path(), "tt_submission").unwrap();
        assert_eq!(files.gds, nested.join("tile.gds"));
        assert_eq!(files.lef, nested.join("tile.lef"));
        assert_eq!(files.verilog, nested.join("tile.v"));
        assert!(files.warnings.is_empty());
    }

    #[test]
    fn falls_back_to_extract_root() {
        let dir = TempDir::new().unwrap();
        for name in ["a.gds", "a.lef", "a.v"] {
            touch(dir.path(), name);
        }

        let files = locate(dir.path(), "tt_submission").unwrap();
        assert_eq!(files.gds, dir.path().join("a.gds"));
    }

    #[test]
    fn duplicates_pick_first_and_warn() {
        let dir = TempDir::new().unwrap();
        for name in ["b.v", "a.v", "a.gds", "a.lef"] {
            touch(dir.path(), name);
        }

        let files = locate(dir.path(), "tt_submission").unwrap();
        assert_eq!(files.verilog, dir.path().join("a.v"));
        assert_eq!(files.warnings.len(), 1);
    }

    #[test]
    fn missing_kind_is_reported() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.gds");
        touch(dir.path(), "a.v");

        let err = locate(dir.path(), "tt_submission").unwrap_err();
        assert_eq!(err.code.as_str(), "archive.missing_file");
        assert_eq!(err.details["extension"], "lef");
    }
}
