//! CLI module for adversario
//!
//! A headless driver: paints synthetic clusters, trains one ensemble and
//! prints its loss curves.

mod args;
mod commands;
mod logging;

pub use args::{Cli, Command, ConfigArgs, InfoArgs, OutputFormat, TrainArgs};
pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};
