use std::path::{Path, PathBuf};

/// Expand `~` in a user-supplied path.
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Where one tile's intermediate and final files live inside the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePaths {
    pub archive: PathBuf,
    pub extract_dir: PathBuf,
    pub gds: PathBuf,
    pub lef: PathBuf,
    pub verilog: PathBuf,
}

impl TilePaths {
    pub fn new(workdir: &Path, basename: &str) -> Self {
        Self {
            archive: workdir.join(format!("{}.zip", basename)),
            extract_dir: workdir.join(basename),
            gds: workdir.join(format!("{}.gds", basename)),
            lef: workdir.join(format!("{}.lef", basename)),
            verilog: workdir.join(format!("{}.v", basename)),
        }
    }
}
