//! `info.yaml` loading and pipeline configuration.
//!
//! The YAML lists the micro tile repositories under `project.micro_tiles`.
//! Entries are either a bare locator or `{ repo, name }`; entries without a
//! name get `<prefix><index>` with a 1-based index.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::TopPolicy;
use crate::utils::io;

pub const DEFAULT_INFO_PATH: &str = "../info.yaml";
pub const DEFAULT_PREFIX: &str = "tt_um_micro";
const TILES_KEY: &str = "project.micro_tiles";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoFile {
    #[serde(default)]
    pub project: Option<ProjectSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub micro_tiles: Option<Vec<TileEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TileEntry {
    Locator(String),
    Detailed {
        repo: String,
        #[serde(default)]
        name: Option<String>,
    },
}

/// One source repository and the basename its outputs are written under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileSource {
    pub repo: String,
    pub basename: String,
}

/// Everything `pipeline::run` needs. Built once by the caller.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sources: Vec<TileSource>,
    pub workdir: PathBuf,
    pub artifact_name: String,
    pub top_policy: TopPolicy,
    pub keep_intermediate: bool,
}

pub fn load_tile_sources(
    path: &Path,
    prefix: &str,
    expected: Option<usize>,
) -> Result<Vec<TileSource>> {
    let content = io::read_file(path, "read info.yaml")?;
    parse_tile_sources(&content, &path.display().to_string(), prefix, expected)
}

/// Resolve the YAML document into an ordered list of sources.
pub fn parse_tile_sources(
    yaml: &str,
    source: &str,
    prefix: &str,
    expected: Option<usize>,
) -> Result<Vec<TileSource>> {
    let info: InfoFile =
        serde_yml::from_str(yaml).map_err(|e| Error::config_invalid_yaml(source, e))?;

    let entries = info
        .project
        .and_then(|p| p.micro_tiles)
        .filter(|tiles| !tiles.is_empty())
        .ok_or_else(|| Error::config_missing_key(TILES_KEY, Some(source.to_string())))?;

    if let Some(expected) = expected {
        if entries.len() != expected {
            return Err(Error::config_invalid_value(
                TILES_KEY,
                Some(entries.len().to_string()),
                format!("expected {} micro tiles, found {}", expected, entries.len()),
            ));
        }
    }

    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let (repo, name) = match entry {
            TileEntry::Locator(repo) => (repo, None),
            TileEntry::Detailed { repo, name } => (repo, name),
        };
        let basename = name.unwrap_or_else(|| format!("{}{}", prefix, index + 1));

        validate_basename(&basename)?;
        if !seen.insert(basename.clone()) {
            return Err(Error::config_invalid_value(
                TILES_KEY,
                Some(basename),
                "tile names must be unique",
            ));
        }

        sources.push(TileSource { repo, basename });
    }

    Ok(sources)
}

/// Basenames become file names, GDS cell names and Verilog module names.
fn validate_basename(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(Error::config_invalid_value(
            TILES_KEY,
            Some(name.to_string()),
            "tile name must start with a letter or '_' and contain only letters, digits and '_'",
        ))
    }
}
