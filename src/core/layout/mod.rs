//! GDSII layout handling: a record-level codec and a cell index on top of it.
//!
//! The library is never rebuilt from a geometry model. Renaming rewrites the
//! affected name records in place, so every shape, property and reference in
//! the file survives unchanged.

mod library;
pub mod record;

#[cfg(test)]
pub(crate) mod fixtures;

pub use library::{Cell, Library, Reference, ReferenceKind, TopPolicy, TopSelection};

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct TopRename {
    pub old_name: String,
    pub new_name: String,
    pub cells: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Rename the top cell of `input` to `new_name` and write the result to `output`.
///
/// `input` and `output` may be the same path.
pub fn rename_top_cell(
    input: &Path,
    output: &Path,
    new_name: &str,
    policy: TopPolicy,
) -> Result<TopRename> {
    let mut lib = Library::load(input)?;
    let top = lib.top_cell(policy)?;

    let mut warnings = Vec::new();
    if let Some(warning) = top.warning {
        log_status!("gds", "Warning: {}", warning);
        warnings.push(warning);
    }

    lib.rename_cell(&top.name, new_name)?;
    lib.save(output)?;

    log_status!(
        "gds",
        "Renamed top cell '{}' to '{}' and saved to '{}'",
        top.name,
        new_name,
        output.display()
    );

    Ok(TopRename {
        old_name: top.name,
        new_name: new_name.to_string(),
        cells: lib.cells().len(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::gds;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn renames_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tile.gds");
        let bytes = gds(&[
            ("sky130_fd_sc_hd__inv_1", &[]),
            ("tt_um_factory", &["sky130_fd_sc_hd__inv_1"]),
        ]);
        fs::write(&path, bytes).unwrap();

        let result =
            rename_top_cell(&path, &path, "tt_um_micro1", TopPolicy::BestEffort).unwrap();
        assert_eq!(result.old_name, "tt_um_factory");
        assert_eq!(result.cells, 2);
        assert!(result.warnings.is_empty());

        let lib = Library::load(&path).unwrap();
        assert!(lib.cell("tt_um_micro1").is_some());
        assert!(lib.cell("sky130_fd_sc_hd__inv_1").is_some());
    }

    #[test]
    fn leaves_input_untouched_when_output_differs() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.gds");
        let output = dir.path().join("out.gds");
        let bytes = gds(&[("LEAF", &[]), ("T1", &["LEAF"]), ("T2", &[])]);
        fs::write(&input, &bytes).unwrap();

        let result = rename_top_cell(&input, &output, "tile", TopPolicy::BestEffort).unwrap();
        assert_eq!(result.old_name, "T1");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(fs::read(&input).unwrap(), bytes);
        assert!(Library::load(&output).unwrap().cell("tile").is_some());
    }

    #[test]
    fn strict_policy_writes_nothing_on_ambiguity() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.gds");
        let output = dir.path().join("out.gds");
        fs::write(&input, gds(&[("A", &[]), ("B", &[])])).unwrap();

        let err = rename_top_cell(&input, &output, "tile", TopPolicy::Strict).unwrap_err();
        assert_eq!(err.code.as_str(), "layout.ambiguous_top");
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_output_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.gds");
        fs::write(&input, gds(&[("TOP", &[])])).unwrap();

        let output = dir.path().join("missing").join("out.gds");
        let err = rename_top_cell(&input, &output, "tile", TopPolicy::BestEffort).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
