use clap::Args;
use serde::Serialize;

use microtiles::layout::{Cell, Library, TopPolicy, TopSelection};
use microtiles::paths;

use super::CmdResult;

#[derive(Args)]
pub struct TopArgs {
    /// GDSII file to inspect
    pub gds: String,

    /// Fail when more than one top cell is found
    #[arg(long)]
    pub strict_top: bool,
}

#[derive(Serialize)]
pub struct TopOutput {
    pub command: &'static str,
    pub path: String,
    pub library: String,
    pub cells: Vec<Cell>,
    pub top: TopSelection,
}

pub fn run(args: TopArgs, _global: &super::GlobalArgs) -> CmdResult<TopOutput> {
    let path = paths::expand(&args.gds);
    let lib = Library::load(&path)?;

    let policy = if args.strict_top {
        TopPolicy::Strict
    } else {
        TopPolicy::BestEffort
    };
    let top = lib.top_cell(policy)?;

    Ok((
        TopOutput {
            command: "top",
            path: path.display().to_string(),
            library: lib.name.clone(),
            cells: lib.cells().to_vec(),
            top,
        },
        0,
    ))
}
