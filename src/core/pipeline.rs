//! Fetch → extract → select → rename → cleanup, once per configured tile.
//!
//! Tiles are processed sequentially. A failure in any step is recorded on
//! that tile's outcome and the next tile still runs.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::archive;
use crate::cleanup::{self, CleanupResult};
use crate::config::{PipelineConfig, TileSource};
use crate::error::{Error, Result};
use crate::github::{ArtifactSource, FetchedArtifact, RepoLocator};
use crate::layout::{self, TopRename};
use crate::lef::{self, MacroRename};
use crate::paths::TilePaths;
use crate::submission;
use crate::verilog::{self, ModuleRename};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileOutputs {
    pub gds: PathBuf,
    pub lef: PathBuf,
    pub verilog: PathBuf,
}

/// What a successful tile produced.
#[derive(Debug, Clone, Serialize)]
pub struct TileReport {
    pub artifact: FetchedArtifact,
    pub outputs: TileOutputs,
    pub gds: TopRename,
    pub lef: MacroRename,
    pub verilog: ModuleRename,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl From<&Error> for TileError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TileOutcome {
    pub basename: String,
    pub repo: String,
    pub status: TileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<TileReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TileError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workdir: PathBuf,
    pub artifact_name: String,
    pub status: RunStatus,
    pub summary: PipelineSummary,
    pub tiles: Vec<TileOutcome>,
}

impl PipelineReport {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Run every configured tile. Only a workdir that cannot be created aborts the run.
pub fn run(config: &PipelineConfig, source: &dyn ArtifactSource) -> Result<PipelineReport> {
    let started_at = Utc::now();
    fs::create_dir_all(&config.workdir).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("create {}", config.workdir.display())),
        )
    })?;

    let total = config.sources.len();
    let mut tiles = Vec::with_capacity(total);

    for (index, tile) in config.sources.iter().enumerate() {
        log_status!(
            "run",
            "[{}/{}] {} <- {}",
            index + 1,
            total,
            tile.basename,
            tile.repo
        );
        tiles.push(run_tile(config, tile, source));
    }

    let succeeded = tiles
        .iter()
        .filter(|t| t.status == TileStatus::Success)
        .count();
    let failed = total - succeeded;
    let status = match (succeeded, failed) {
        (_, 0) => RunStatus::Success,
        (0, _) => RunStatus::Failed,
        _ => RunStatus::PartialSuccess,
    };

    log_status!("run", "{} of {} tiles processed", succeeded, total);

    Ok(PipelineReport {
        started_at,
        finished_at: Utc::now(),
        workdir: config.workdir.clone(),
        artifact_name: config.artifact_name.clone(),
        status,
        summary: PipelineSummary {
            total,
            succeeded,
            failed,
        },
        tiles,
    })
}

fn run_tile(config: &PipelineConfig, tile: &TileSource, source: &dyn ArtifactSource) -> TileOutcome {
    let paths = TilePaths::new(&config.workdir, &tile.basename);
    let result = process_tile(config, tile, &paths, source);

    let mut warnings = Vec::new();
    let cleanup = if config.keep_intermediate {
        None
    } else {
        match cleanup::remove_intermediate(&paths) {
            Ok(done) => Some(done),
            Err(err) => {
                let warning = format!("Cleanup failed: {}", err);
                log_status!("cleanup", "Warning: {}", warning);
                warnings.push(warning);
                None
            }
        }
    };

    match result {
        Ok(report) => TileOutcome {
            basename: tile.basename.clone(),
            repo: tile.repo.clone(),
            status: TileStatus::Success,
            report: Some(report),
            error: None,
            cleanup,
            warnings,
        },
        Err(err) => {
            log_status!("run", "{} failed: {}", tile.basename, err);
            TileOutcome {
                basename: tile.basename.clone(),
                repo: tile.repo.clone(),
                status: TileStatus::Failed,
                report: None,
                error: Some(TileError::from(&err)),
                cleanup,
                warnings,
            }
        }
    }
}

/// Fetch one tile's artifact and write its renamed GDS, LEF and Verilog.
pub fn process_tile(
    config: &PipelineConfig,
    tile: &TileSource,
    paths: &TilePaths,
    source: &dyn ArtifactSource,
) -> Result<TileReport> {
    let locator = RepoLocator::parse(&tile.repo)?;

    // Files kept from an earlier run would be picked up next to the fresh ones.
    cleanup::remove_intermediate(paths)?;

    let artifact = source.fetch(&locator, &config.artifact_name, &paths.archive)?;
    archive::extract(&paths.archive, &paths.extract_dir)?;
    let files = submission::locate(&paths.extract_dir, &config.artifact_name)?;

    let gds = layout::rename_top_cell(&files.gds, &paths.gds, &tile.basename, config.top_policy)?;
    let lef = lef::rename_macro(&files.lef, &paths.lef, &tile.basename)?;
    let verilog = verilog::rename_module(&files.verilog, &paths.verilog, &tile.basename)?;

    let warnings: Vec<String> = files
        .warnings
        .iter()
        .chain(&gds.warnings)
        .chain(&lef.warnings)
        .chain(&verilog.warnings)
        .cloned()
        .collect();

    Ok(TileReport {
        artifact,
        outputs: TileOutputs {
            gds: paths.gds.clone(),
            lef: paths.lef.clone(),
            verilog: paths.verilog.clone(),
        },
        gds,
        lef,
        verilog,
        warnings,
    })
}
