use clap::Args;
use serde::Serialize;

use microtiles::config;
use microtiles::github::RepoLocator;
use microtiles::paths;

use super::CmdResult;

#[derive(Args)]
pub struct TilesArgs {
    /// YAML file listing the micro tile repositories under project.micro_tiles
    #[arg(long, value_name = "PATH", default_value = config::DEFAULT_INFO_PATH)]
    pub info: String,

    /// Prefix for generated tile names
    #[arg(long, default_value = config::DEFAULT_PREFIX)]
    pub prefix: String,

    /// Fail unless exactly this many tiles are configured
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Serialize)]
pub struct TileLine {
    pub basename: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct TilesOutput {
    pub command: &'static str,
    pub info: String,
    pub count: usize,
    pub tiles: Vec<TileLine>,
}

pub fn run(args: TilesArgs, _global: &super::GlobalArgs) -> CmdResult<TilesOutput> {
    let info = paths::expand(&args.info);
    let sources = config::load_tile_sources(&info, &args.prefix, args.count)?;

    // Locators are only parsed here so a bad one shows up next to the others.
    let tiles: Vec<TileLine> = sources
        .into_iter()
        .map(|source| {
            let parsed = RepoLocator::parse(&source.repo);
            TileLine {
                slug: parsed.as_ref().ok().map(RepoLocator::slug),
                error: parsed.err().map(|e| e.message),
                basename: source.basename,
                repo: source.repo,
            }
        })
        .collect();

    let exit_code = if tiles.iter().any(|t| t.error.is_some()) {
        2
    } else {
        0
    };

    Ok((
        TilesOutput {
            command: "tiles",
            info: info.display().to_string(),
            count: tiles.len(),
            tiles,
        },
        exit_code,
    ))
}
