//! Adversario CLI
//!
//! Headless driver for the GAN sandbox.
//!
//! # Usage
//!
//! ```bash
//! # Train the default ensemble on three painted clusters
//! adversario train
//!
//! # Train one ensemble from a session file
//! adversario train session.yaml --ensemble madgan --iterations 2000 --trace
//!
//! # Validate a session file
//! adversario validate session.yaml
//!
//! # Show ensembles and parameter counts
//! adversario info session.yaml
//! ```

use clap::Parser;
use adversario::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
