use clap::Args;
use serde::Serialize;

use microtiles::config::{self, PipelineConfig};
use microtiles::github::{self, GitHubClient};
use microtiles::layout::TopPolicy;
use microtiles::paths;
use microtiles::pipeline::{self, PipelineReport};

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// YAML file listing the micro tile repositories under project.micro_tiles
    #[arg(long, value_name = "PATH", default_value = config::DEFAULT_INFO_PATH)]
    pub info: String,

    /// Directory the renamed .gds/.lef/.v files are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: String,

    /// Name of the workflow artifact to download
    #[arg(long, value_name = "NAME", default_value = github::DEFAULT_ARTIFACT_NAME)]
    pub artifact: String,

    /// Prefix for generated tile names (tile N becomes <prefix>N)
    #[arg(long, default_value = config::DEFAULT_PREFIX)]
    pub prefix: String,

    /// Fail unless exactly this many tiles are configured
    #[arg(long)]
    pub count: Option<usize>,

    /// Fail a tile whose layout has more than one top cell instead of renaming the first
    #[arg(long)]
    pub strict_top: bool,

    /// GitHub REST API base URL
    #[arg(long, value_name = "URL", default_value = github::DEFAULT_API_URL)]
    pub api_url: String,

    /// Environment variable holding the GitHub token
    #[arg(long, value_name = "VAR", default_value = github::DEFAULT_TOKEN_ENV)]
    pub token_env: String,

    /// Keep each tile's downloaded archive and extraction directory
    #[arg(long)]
    pub keep_intermediate: bool,
}

#[derive(Serialize)]
pub struct RunOutput {
    pub command: &'static str,
    pub info: String,
    #[serde(flatten)]
    pub report: PipelineReport,
}

pub fn run(args: RunArgs, _global: &super::GlobalArgs) -> CmdResult<RunOutput> {
    let info = paths::expand(&args.info);
    let sources = config::load_tile_sources(&info, &args.prefix, args.count)?;
    let client = GitHubClient::from_env(&args.api_url, &args.token_env)?;

    let config = PipelineConfig {
        sources,
        workdir: paths::expand(&args.workdir),
        artifact_name: args.artifact,
        top_policy: if args.strict_top {
            TopPolicy::Strict
        } else {
            TopPolicy::BestEffort
        },
        keep_intermediate: args.keep_intermediate,
    };

    let report = pipeline::run(&config, &client)?;
    let exit_code = if report.has_failures() { 1 } else { 0 };

    Ok((
        RunOutput {
            command: "run",
            info: info.display().to_string(),
            report,
        },
        exit_code,
    ))
}
