use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::record::{read_stream, record_type, Record, Stream, MAX_PAYLOAD};
use crate::error::{Error, Result};
use crate::utils::io;

/// What to do when more than one cell is unreferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopPolicy {
    /// Take the first candidate in file order and warn.
    #[default]
    BestEffort,
    /// Refuse to pick.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Sref,
    Aref,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    pub target: String,
    pub kind: ReferenceKind,
    #[serde(skip)]
    record: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub name: String,
    /// BOUNDARY, PATH, BOX and NODE elements.
    pub shapes: usize,
    /// TEXT elements.
    pub labels: usize,
    pub references: Vec<Reference>,
    #[serde(skip)]
    name_record: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopSelection {
    pub name: String,
    pub candidates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A GDSII library indexed by cell, backed by the record stream it was read from.
#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    cells: Vec<Cell>,
    stream: Stream,
}

impl Library {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = io::read_bytes(path, "read GDS")?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let stream = read_stream(bytes)?;
        let (name, cells) = index_cells(&stream.records)?;
        Ok(Self {
            name,
            cells,
            stream,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.stream.to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        io::write_file_atomic(path, &self.to_bytes(), "write GDS")
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.name == name)
    }

    /// Cells that no other cell references, in file order.
    pub fn top_cells(&self) -> Vec<&Cell> {
        let referenced: HashSet<&str> = self
            .cells
            .iter()
            .flat_map(|c| c.references.iter().map(|r| r.target.as_str()))
            .collect();

        self.cells
            .iter()
            .filter(|c| !referenced.contains(c.name.as_str()))
            .collect()
    }

    pub fn top_cell(&self, policy: TopPolicy) -> Result<TopSelection> {
        if self.cells.is_empty() {
            return Err(Error::layout_no_top_cell("library contains no cells"));
        }

        let candidates: Vec<String> = self.top_cells().iter().map(|c| c.name.clone()).collect();

        match candidates.len() {
            0 => Err(
                Error::layout_no_top_cell("every cell is referenced by another cell")
                    .with_hint("The cell hierarchy contains a reference cycle"),
            ),
            1 => Ok(TopSelection {
                name: candidates[0].clone(),
                candidates,
                warning: None,
            }),
            _ if policy == TopPolicy::Strict => Err(Error::layout_ambiguous_top(candidates)),
            n => {
                let warning = format!(
                    "Multiple top cells found ({}); renaming the first one detected: {}",
                    n, candidates[0]
                );
                Ok(TopSelection {
                    name: candidates[0].clone(),
                    candidates,
                    warning: Some(warning),
                })
            }
        }
    }

    /// Rename a cell and every reference to it. Returns false when `new` is
    /// already the cell's name.
    pub fn rename_cell(&mut self, old: &str, new: &str) -> Result<bool> {
        validate_cell_name(new)?;

        let index = self
            .cells
            .iter()
            .position(|c| c.name == old)
            .ok_or_else(|| Error::layout_invalid(format!("cell '{}' not found", old)))?;

        if old == new {
            return Ok(false);
        }
        if self.cell(new).is_some() {
            return Err(Error::layout_invalid(format!(
                "cannot rename '{}': cell '{}' already exists",
                old, new
            )));
        }

        let name_record = self.cells[index].name_record;
        self.stream.records[name_record] = Record::ascii(record_type::STRNAME, new);
        self.cells[index].name = new.to_string();

        for cell in &mut self.cells {
            for reference in cell.references.iter_mut().filter(|r| r.target == old) {
                self.stream.records[reference.record] = Record::ascii(record_type::SNAME, new);
                reference.target = new.to_string();
            }
        }

        Ok(true)
    }
}

fn validate_cell_name(name: &str) -> Result<()> {
    let problem = if name.is_empty() {
        Some("cell name cannot be empty")
    } else if !name.is_ascii() || name.contains('\0') {
        Some("cell name must be ASCII without NUL bytes")
    } else if name.len() > MAX_PAYLOAD {
        Some("cell name does not fit in a GDSII record")
    } else {
        None
    };

    match problem {
        Some(problem) => Err(Error::validation_invalid_argument(
            "name",
            problem,
            Some(name.to_string()),
        )),
        None => Ok(()),
    }
}

/// Walk the record stream and build the cell index.
fn index_cells(records: &[Record]) -> Result<(String, Vec<Cell>)> {
    match records.first() {
        Some(r) if r.rtype == record_type::HEADER => {}
        _ => return Err(Error::layout_invalid("stream does not start with HEADER")),
    }

    let mut lib_name = String::new();
    let mut cells: Vec<Cell> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<Cell> = None;
    let mut pending_ref: Option<ReferenceKind> = None;

    for (idx, record) in records.iter().enumerate() {
        match record.rtype {
            record_type::LIBNAME => lib_name = record.as_ascii(),
            record_type::BGNSTR => {
                if current.is_some() {
                    return Err(Error::layout_invalid(format!(
                        "BGNSTR at record {} inside another structure",
                        idx
                    )));
                }
                current = Some(Cell {
                    name: String::new(),
                    shapes: 0,
                    labels: 0,
                    references: Vec::new(),
                    name_record: usize::MAX,
                });
            }
            record_type::STRNAME => {
                let cell = current
                    .as_mut()
                    .ok_or_else(|| outside_structure("STRNAME", idx))?;
                cell.name = record.as_ascii();
                cell.name_record = idx;
            }
            record_type::ENDSTR => {
                let cell = current
                    .take()
                    .ok_or_else(|| outside_structure("ENDSTR", idx))?;
                if cell.name_record == usize::MAX {
                    return Err(Error::layout_invalid(format!(
                        "structure ending at record {} has no STRNAME",
                        idx
                    )));
                }
                if !seen.insert(cell.name.clone()) {
                    return Err(Error::layout_invalid(format!(
                        "duplicate cell name '{}'",
                        cell.name
                    )));
                }
                cells.push(cell);
            }
            record_type::BOUNDARY | record_type::PATH | record_type::BOX | record_type::NODE => {
                current
                    .as_mut()
                    .ok_or_else(|| outside_structure("element", idx))?
                    .shapes += 1;
            }
            record_type::TEXT => {
                current
                    .as_mut()
                    .ok_or_else(|| outside_structure("TEXT", idx))?
                    .labels += 1;
            }
            record_type::SREF | record_type::AREF => {
                if current.is_none() {
                    return Err(outside_structure("reference", idx));
                }
                pending_ref = Some(if record.rtype == record_type::SREF {
                    ReferenceKind::Sref
                } else {
                    ReferenceKind::Aref
                });
            }
            record_type::SNAME => {
                let kind = pending_ref
                    .take()
                    .ok_or_else(|| outside_structure("SNAME", idx))?;
                // pending_ref is only set inside a structure
                if let Some(cell) = current.as_mut() {
                    cell.references.push(Reference {
                        target: record.as_ascii(),
                        kind,
                        record: idx,
                    });
                }
            }
            record_type::ENDEL => pending_ref = None,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(Error::layout_invalid("structure is missing ENDSTR"));
    }

    Ok((lib_name, cells))
}

fn outside_structure(what: &str, idx: usize) -> Error {
    Error::layout_invalid(format!("{} at record {} is outside a structure", what, idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixtures::{gds, GdsFixture};

    fn shape_and_ref_counts(lib: &Library) -> (usize, usize) {
        lib.cells().iter().fold((0, 0), |(s, r), c| {
            (s + c.shapes, r + c.references.len())
        })
    }

    #[test]
    fn top_cells_are_listed_in_file_order() {
        let bytes = gds(&[("INV", &[]), ("TOP", &["INV", "INV"]), ("BUF", &[])]);
        let lib = Library::from_bytes(&bytes).unwrap();

        let names: Vec<&str> = lib.top_cells().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["TOP", "BUF"]);
    }

    #[test]
    fn single_unreferenced_cell_is_the_top() {
        let bytes = gds(&[("INV", &[]), ("BUF", &["INV"]), ("TOP", &["BUF", "INV"])]);
        let lib = Library::from_bytes(&bytes).unwrap();

        let top = lib.top_cell(TopPolicy::Strict).unwrap();
        assert_eq!(top.name, "TOP");
        assert_eq!(top.candidates, vec!["TOP"]);
        assert!(top.warning.is_none());
    }

    #[test]
    fn cyclic_hierarchy_has_no_top() {
        let bytes = gds(&[("A", &["B"]), ("B", &["A"])]);
        let lib = Library::from_bytes(&bytes).unwrap();

        let err = lib.top_cell(TopPolicy::BestEffort).unwrap_err();
        assert_eq!(err.code.as_str(), "layout.no_top_cell");
    }

    #[test]
    fn self_reference_is_not_a_top() {
        let bytes = gds(&[("LOOP", &["LOOP"])]);
        let lib = Library::from_bytes(&bytes).unwrap();
        assert!(lib.top_cells().is_empty());
    }

    #[test]
    fn empty_library_has_no_top() {
        let bytes = gds(&[]);
        let lib = Library::from_bytes(&bytes).unwrap();
        let err = lib.top_cell(TopPolicy::BestEffort).unwrap_err();
        assert_eq!(err.code.as_str(), "layout.no_top_cell");
    }

    #[test]
    fn multiple_tops_follow_policy() {
        let bytes = gds(&[("LEAF", &[]), ("T1", &["LEAF"]), ("T2", &["LEAF"])]);
        let lib = Library::from_bytes(&bytes).unwrap();

        let best = lib.top_cell(TopPolicy::BestEffort).unwrap();
        assert_eq!(best.name, "T1");
        assert_eq!(best.candidates, vec!["T1", "T2"]);
        assert!(best.warning.unwrap().contains("Multiple top cells"));

        let err = lib.top_cell(TopPolicy::Strict).unwrap_err();
        assert_eq!(err.code.as_str(), "layout.ambiguous_top");
        assert_eq!(err.details["candidates"][1], "T2");
    }

    #[test]
    fn unmodified_library_round_trips_exactly() {
        let bytes = GdsFixture::new(&[("LEAF", &[]), ("TOP", &["LEAF"])])
            .with_label("TOP")
            .with_padding(32)
            .build();
        let lib = Library::from_bytes(&bytes).unwrap();
        assert_eq!(lib.name, "fixture");
        assert_eq!(lib.cell("TOP").unwrap().labels, 1);
        assert_eq!(lib.to_bytes(), bytes);
    }

    #[test]
    fn rename_preserves_counts_and_other_cells() {
        let bytes = gds(&[("LEAF", &[]), ("MID", &["LEAF"]), ("TOP", &["MID", "LEAF"])]);
        let mut lib = Library::from_bytes(&bytes).unwrap();
        let before = shape_and_ref_counts(&lib);

        assert!(lib.rename_cell("TOP", "tt_um_micro1").unwrap());

        let reparsed = Library::from_bytes(&lib.to_bytes()).unwrap();
        assert_eq!(shape_and_ref_counts(&reparsed), before);
        let names: Vec<&str> = reparsed.cells().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["LEAF", "MID", "tt_um_micro1"]);
        assert_eq!(
            reparsed.top_cell(TopPolicy::Strict).unwrap().name,
            "tt_um_micro1"
        );
    }

    #[test]
    fn rename_leaves_non_top_bytes_untouched() {
        let bytes = gds(&[("LEAF", &[]), ("TOP", &["LEAF"])]);
        let mut lib = Library::from_bytes(&bytes).unwrap();
        // Same length as "TOP" after padding, so every other byte keeps its offset.
        lib.rename_cell("TOP", "NEW").unwrap();
        let out = lib.to_bytes();

        assert_eq!(out.len(), bytes.len());
        let diffs: Vec<usize> = (0..out.len()).filter(|&i| out[i] != bytes[i]).collect();
        assert_eq!(diffs.len(), 3);
        assert_eq!(&out[diffs[0]..diffs[0] + 3], b"NEW");
    }

    #[test]
    fn longer_name_changes_only_the_strname_record() {
        let bytes = GdsFixture::new(&[("LEAF", &[]), ("T", &["LEAF"])])
            .with_padding(16)
            .build();
        let mut lib = Library::from_bytes(&bytes).unwrap();
        lib.rename_cell("T", "tt_um_micro1").unwrap();

        let before = read_stream(&bytes).unwrap();
        let after = read_stream(&lib.to_bytes()).unwrap();

        assert_eq!(after.records.len(), before.records.len());
        assert_eq!(after.trailer, before.trailer);
        let changed: Vec<usize> = (0..before.records.len())
            .filter(|&i| before.records[i] != after.records[i])
            .collect();
        assert_eq!(changed.len(), 1);
        let record = &after.records[changed[0]];
        assert_eq!(record.rtype, record_type::STRNAME);
        assert_eq!(record.as_ascii(), "tt_um_micro1");
    }

    #[test]
    fn rename_updates_references_to_the_cell() {
        let bytes = gds(&[("LEAF", &[]), ("TOP", &["LEAF", "LEAF"])]);
        let mut lib = Library::from_bytes(&bytes).unwrap();

        lib.rename_cell("LEAF", "unit_cell").unwrap();

        let reparsed = Library::from_bytes(&lib.to_bytes()).unwrap();
        let top = reparsed.cell("TOP").unwrap();
        assert!(top.references.iter().all(|r| r.target == "unit_cell"));
        assert_eq!(reparsed.top_cell(TopPolicy::Strict).unwrap().name, "TOP");
    }

    #[test]
    fn rename_is_idempotent() {
        let bytes = gds(&[("LEAF", &[]), ("TOP", &["LEAF"])]);
        let mut once = Library::from_bytes(&bytes).unwrap();
        once.rename_cell("TOP", "tile").unwrap();
        let first = once.to_bytes();

        let mut twice = Library::from_bytes(&first).unwrap();
        let top = twice.top_cell(TopPolicy::BestEffort).unwrap().name;
        assert!(!twice.rename_cell(&top, "tile").unwrap());
        assert_eq!(twice.to_bytes(), first);
    }

    #[test]
    fn rename_rejects_collisions_and_bad_names() {
        let bytes = gds(&[("LEAF", &[]), ("TOP", &["LEAF"])]);
        let mut lib = Library::from_bytes(&bytes).unwrap();

        let err = lib.rename_cell("TOP", "LEAF").unwrap_err();
        assert_eq!(err.code.as_str(), "layout.invalid");

        let err = lib.rename_cell("TOP", "").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");

        let err = lib.rename_cell("MISSING", "X").unwrap_err();
        assert!(err.message.contains("MISSING"));
    }

    #[test]
    fn duplicate_cell_names_are_rejected() {
        let bytes = gds(&[("A", &[]), ("A", &[])]);
        let err = Library::from_bytes(&bytes).unwrap_err();
        assert!(err.message.contains("duplicate cell name"));
    }
}
