//! LEF macro rename.
//!
//! Renames the first `MACRO` block: the `MACRO <name>` line, the matching
//! `END <name>` line and any `FOREIGN <name>` line inside it. All other bytes
//! pass through unchanged.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::{io, parser};

#[derive(Debug, Clone, Serialize)]
pub struct MacroRename {
    pub old_name: String,
    pub new_name: String,
    pub end_lines: usize,
    pub foreign_lines: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Rewrite LEF text. `source` names the file in errors.
pub fn rename_macro_text(
    content: &str,
    new_name: &str,
    source: &str,
) -> Result<(String, MacroRename)> {
    if new_name.is_empty() || new_name.contains(char::is_whitespace) {
        return Err(Error::validation_invalid_argument(
            "name",
            "macro name cannot be empty or contain whitespace",
            Some(new_name.to_string()),
        ));
    }

    let mut out = String::with_capacity(content.len() + new_name.len() * 3);
    let mut old_name: Option<String> = None;
    let mut end_lines = 0;
    let mut foreign_lines = 0;
    let mut extra_macros = 0;

    for line in parser::lines(content) {
        let Some((keyword, span)) = parser::leading_tokens(line) else {
            out.push_str(line);
            continue;
        };

        let token = &line[span.clone()];
        let rewrite = match keyword {
            "MACRO" if old_name.is_none() => {
                old_name = Some(token.to_string());
                true
            }
            "MACRO" => {
                extra_macros += 1;
                false
            }
            "END" if old_name.as_deref() == Some(token) => {
                end_lines += 1;
                true
            }
            "FOREIGN" if old_name.as_deref() == Some(token) => {
                foreign_lines += 1;
                true
            }
            _ => false,
        };

        if rewrite {
            out.push_str(&parser::replace_span(line, span, new_name));
        } else {
            out.push_str(line);
        }
    }

    let old_name = old_name.ok_or_else(|| Error::record_not_found(source, "MACRO"))?;
    if end_lines == 0 {
        return Err(Error::record_not_found(source, format!("END {}", old_name)));
    }

    let mut warnings = Vec::new();
    if extra_macros > 0 {
        warnings.push(format!(
            "{} additional MACRO block(s) left unchanged",
            extra_macros
        ));
    }

    Ok((
        out,
        MacroRename {
            old_name,
            new_name: new_name.to_string(),
            end_lines,
            foreign_lines,
            warnings,
        },
    ))
}

/// Rename the macro in `input` and write the result to `output` (may be the same path).
pub fn rename_macro(input: &Path, output: &Path, new_name: &str) -> Result<MacroRename> {
    let content = io::read_file(input, "read LEF")?;
    let source = input.display().to_string();
    let (rewritten, result) = rename_macro_text(&content, new_name, &source)?;

    for warning in &result.warnings {
        log_status!("lef", "Warning: {}", warning);
    }

    io::write_file_atomic(output, rewritten.as_bytes(), "write LEF")?;
    log_status!(
        "lef",
        "Renamed macro '{}' to '{}' and saved to '{}'",
        result.old_name,
        new_name,
        output.display()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LEF: &str = "VERSION 5.7 ;
BUSBITCHARS \"[]\" ;
MACRO tt_um_factory_test
  CLASS BLOCK ;
  FOREIGN tt_um_factory_test ;
  ORIGIN 0.000 0.000 ;
  SIZE 161.000 BY 111.520 ;
  PIN clk
    DIRECTION INPUT ;
  END clk
END tt_um_factory_test
END LIBRARY
";

    #[test]
    fn renames_macro_end_and_foreign() {
        let (out, result) = rename_macro_text(LEF, "tt_um_micro1", "test.lef").unwrap();

        assert!(out.contains("MACRO tt_um_micro1\n"));
        assert!(out.contains("  FOREIGN tt_um_micro1 ;\n"));
        assert!(out.contains("\nEND tt_um_micro1\n"));
        assert!(!out.contains("tt_um_factory_test"));
        assert_eq!(result.old_name, "tt_um_factory_test");
        assert_eq!(result.end_lines, 1);
        assert_eq!(result.foreign_lines, 1);
    }

    #[test]
    fn unrelated_lines_are_byte_identical() {
        let (out, _) = rename_macro_text(LEF, "tt_um_micro1", "test.lef").unwrap();

        let before: Vec<&str> = parser::lines(LEF).collect();
        let after: Vec<&str> = parser::lines(&out).collect();
        assert_eq!(before.len(), after.len());

        let changed: Vec<usize> = (0..before.len())
            .filter(|&i| before[i] != after[i])
            .collect();
        assert_eq!(changed, vec![2, 4, 10]);
        assert_eq!(after[9], "  END clk\n");
        assert_eq!(after[11], "END LIBRARY\n");
    }

    #[test]
    fn minimal_macro_block() {
        let (out, _) = rename_macro_text("MACRO foo\n...\nEND foo\n", "bar", "x.lef").unwrap();
        assert_eq!(out, "MACRO bar\n...\nEND bar\n");
    }

    #[test]
    fn missing_macro_is_reported() {
        let err = rename_macro_text("VERSION 5.7 ;\nEND LIBRARY\n", "bar", "x.lef").unwrap_err();
        assert_eq!(err.code.as_str(), "record.not_found");
        assert_eq!(err.details["record"], "MACRO");
    }

    #[test]
    fn macro_without_matching_end_is_reported() {
        let err = rename_macro_text("MACRO foo\nEND LIBRARY\n", "bar", "x.lef").unwrap_err();
        assert_eq!(err.details["record"], "END foo");
    }

    #[test]
    fn whitespace_in_new_name_is_rejected() {
        let err = rename_macro_text("MACRO foo\nEND foo\n", "a b", "x.lef").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn only_first_macro_is_renamed() {
        let lef = "MACRO a\nEND a\nMACRO b\nEND b\n";
        let (out, result) = rename_macro_text(lef, "tile", "x.lef").unwrap();
        assert_eq!(out, "MACRO tile\nEND tile\nMACRO b\nEND b\n");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn rename_in_place_and_keep_crlf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tile.lef");
        fs::write(&path, "MACRO foo\r\n  SIZE 1 BY 1 ;\r\nEND foo\r\n").unwrap();

        rename_macro(&path, &path, "tt_um_micro3").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "MACRO tt_um_micro3\r\n  SIZE 1 BY 1 ;\r\nEND tt_um_micro3\r\n"
        );
    }

    #[test]
    fn failed_rename_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.lef");
        let output = dir.path().join("out.lef");
        fs::write(&input, "VERSION 5.7 ;\n").unwrap();

        assert!(rename_macro(&input, &output, "tile").is_err());
        assert!(!output.exists());
    }
}
