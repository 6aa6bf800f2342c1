pub type CmdResult<T> = microtiles::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod rename;
pub mod run;
pub mod tiles;
pub mod top;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (microtiles::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Tiles(args) => dispatch!(args, global, tiles),
        crate::Commands::Top(args) => dispatch!(args, global, top),
        crate::Commands::Rename(args) => dispatch!(args, global, rename),
    }
}
