use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{rename, run, tiles, top, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "microtiles")]
#[command(version = VERSION)]
#[command(about = "Fetch micro tile submissions and rename them for integration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and rename every configured tile
    Run(run::RunArgs),
    /// List the configured tiles and their output names
    Tiles(tiles::TilesArgs),
    /// Show the cells and top cell of a GDSII file
    Top(top::TopArgs),
    /// Rename the top identifier of a single GDS, LEF or Verilog file
    Rename(rename::RenameArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
