use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use microtiles::layout::{self, TopPolicy, TopRename};
use microtiles::lef::{self, MacroRename};
use microtiles::paths;
use microtiles::verilog::{self, ModuleRename};

use super::CmdResult;

#[derive(Args)]
pub struct RenameArgs {
    #[command(subcommand)]
    command: RenameCommand,
}

#[derive(Subcommand)]
enum RenameCommand {
    /// Rename the top cell of a GDSII layout
    Gds {
        /// Input .gds file
        input: String,

        /// New top cell name
        #[arg(long)]
        name: String,

        /// Output path (defaults to rewriting the input in place)
        #[arg(long, value_name = "PATH")]
        output: Option<String>,

        /// Fail when more than one top cell is found
        #[arg(long)]
        strict_top: bool,
    },
    /// Rename the MACRO (with its END and FOREIGN lines) in a LEF file
    Lef {
        /// Input .lef file
        input: String,

        /// New macro name
        #[arg(long)]
        name: String,

        /// Output path (defaults to rewriting the input in place)
        #[arg(long, value_name = "PATH")]
        output: Option<String>,
    },
    /// Rename the first module declared in a Verilog file
    Verilog {
        /// Input .v file
        input: String,

        /// New module name
        #[arg(long)]
        name: String,

        /// Output path (defaults to rewriting the input in place)
        #[arg(long, value_name = "PATH")]
        output: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RenameResult {
    Gds(TopRename),
    Lef(MacroRename),
    Verilog(ModuleRename),
}

#[derive(Serialize)]
pub struct RenameOutput {
    pub command: &'static str,
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub result: RenameResult,
}

pub fn run(args: RenameArgs, _global: &super::GlobalArgs) -> CmdResult<RenameOutput> {
    let output = match args.command {
        RenameCommand::Gds {
            input,
            name,
            output,
            strict_top,
        } => {
            let (input, output) = resolve(&input, output.as_deref());
            let policy = if strict_top {
                TopPolicy::Strict
            } else {
                TopPolicy::BestEffort
            };
            let result = layout::rename_top_cell(&input, &output, &name, policy)?;
            RenameOutput {
                command: "rename.gds",
                input,
                output,
                result: RenameResult::Gds(result),
            }
        }
        RenameCommand::Lef {
            input,
            name,
            output,
        } => {
            let (input, output) = resolve(&input, output.as_deref());
            let result = lef::rename_macro(&input, &output, &name)?;
            RenameOutput {
                command: "rename.lef",
                input,
                output,
                result: RenameResult::Lef(result),
            }
        }
        RenameCommand::Verilog {
            input,
            name,
            output,
        } => {
            let (input, output) = resolve(&input, output.as_deref());
            let result = verilog::rename_module(&input, &output, &name)?;
            RenameOutput {
                command: "rename.verilog",
                input,
                output,
                result: RenameResult::Verilog(result),
            }
        }
    };

    Ok((output, 0))
}

fn resolve(input: &str, output: Option<&str>) -> (PathBuf, PathBuf) {
    let input = paths::expand(input);
    let output = output.map(paths::expand).unwrap_or_else(|| input.clone());
    (input, output)
}
