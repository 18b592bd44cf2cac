//! CLI command implementations

mod info;
mod train;
mod validate;


use std::path::Path;

use crate::cli::{init_tracing, Cli, Command, LogLevel};
use crate::config::{load_config, SessionConfig};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);
    init_tracing(log_level);

    match cli.command {
        Command::Train(args) => train::run_train(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
    }
}

/// Load `path`, or the built-in presets when there is none.
fn session_config(path: Option<&Path>) -> Result<SessionConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|e| format!("Config error [{}]: {e}", e.code())),
        None => Ok(SessionConfig::default()),
    }
}
