//! Verilog module rename.
//!
//! Only the first `module <name>` declaration is renamed. Submissions carry a
//! single top module; any later declarations pass through and are reported.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::{io, parser};

#[derive(Debug, Clone, Serialize)]
pub struct ModuleRename {
    pub old_name: String,
    pub new_name: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*module\s+([A-Za-z_][A-Za-z0-9_$]*|\\\S+)")
            .expect("module declaration pattern is valid")
    })
}

fn identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
    })
}

/// Rewrite Verilog text. `source` names the file in errors.
pub fn rename_module_text(
    content: &str,
    new_name: &str,
    source: &str,
) -> Result<(String, ModuleRename)> {
    if !identifier().is_match(new_name) {
        return Err(Error::validation_invalid_argument(
            "name",
            "module name must be a simple Verilog identifier",
            Some(new_name.to_string()),
        ));
    }

    let mut out = String::with_capacity(content.len() + new_name.len());
    let mut renamed: Option<(String, usize)> = None;
    let mut other_modules = 0;

    for (index, line) in parser::lines(content).enumerate() {
        let Some(name) = declaration().captures(line).and_then(|caps| caps.get(1)) else {
            out.push_str(line);
            continue;
        };

        if renamed.is_some() {
            other_modules += 1;
            out.push_str(line);
            continue;
        }

        renamed = Some((name.as_str().to_string(), index + 1));
        out.push_str(&parser::replace_span(line, name.range(), new_name));
    }

    let (old_name, line) = renamed.ok_or_else(|| Error::record_not_found(source, "module"))?;

    let mut warnings = Vec::new();
    if other_modules > 0 {
        warnings.push(format!(
            "{} additional module declaration(s) left unchanged",
            other_modules
        ));
    }

    Ok((
        out,
        ModuleRename {
            old_name,
            new_name: new_name.to_string(),
            line,
            warnings,
        },
    ))
}

/// Rename the first module in `input` and write the result to `output` (may be the same path).
pub fn rename_module(input: &Path, output: &Path, new_name: &str) -> Result<ModuleRename> {
    let content = io::read_file(input, "read Verilog")?;
    let source = input.display().to_string();
    let (rewritten, result) = rename_module_text(&content, new_name, &source)?;

    for warning in &result.warnings {
        log_status!("verilog", "Warning: {}", warning);
    }

    io::write_file_atomic(output, rewritten.as_bytes(), "write Verilog")?;
    log_status!(
        "verilog",
        "Renamed module '{}' to '{}' and saved to '{}'",
        result.old_name,
        new_name,
        output.display()
    );

    Ok(result)
}
