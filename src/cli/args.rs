//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Adversario: live training sandbox for toy 2-D GANs
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "adversario")]
#[command(version)]
#[command(about = "Train vanilla GAN, InfoGAN, DoPaNet and MAD-GAN on painted 2-D point clouds")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Paint synthetic clusters and train one ensemble on them
    Train(TrainArgs),

    /// Validate a session file without training
    Validate(ConfigArgs),

    /// Show the ensembles a session file describes
    Info(InfoArgs),
}

/// Arguments for the train command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Session file; built-in presets when omitted
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Ensemble to train instead of the configured active one
    #[arg(short, long)]
    pub ensemble: Option<String>,

    /// Stop after this many iterations
    #[arg(short, long)]
    pub iterations: Option<u64>,

    /// Random seed for weights, sampling and painting
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of clusters to paint
    #[arg(long, default_value_t = 3)]
    pub clusters: usize,

    /// Points per cluster
    #[arg(long, default_value_t = 50)]
    pub points: usize,

    /// Print per-phase timings when done
    #[arg(long)]
    pub trace: bool,
}

/// Arguments taking just a session file
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ConfigArgs {
    /// Session file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the info command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Session file; built-in presets when omitted
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}
