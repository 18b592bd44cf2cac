//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::{ConfigArgs, LogLevel};
use crate::config::SessionConfig;
use crate::generative::EnsembleConfig;

/// One line per ensemble
pub fn format_ensemble_summary(config: &EnsembleConfig) -> String {
    format!(
        "  {} ({}): latent {}, batch {}, generator {:?}, discriminator {:?}",
        config.name,
        config.variant,
        config.latent_dim,
        config.batch_size,
        config.generator_widths(),
        config.discriminator_widths()
    )
}

pub fn format_session_summary(config: &SessionConfig) -> String {
    let mut lines = vec![format!("  Active: {}", config.active_name().unwrap_or("-"))];
    lines.extend(config.ensembles.iter().map(format_ensemble_summary));
    lines.join("\n")
}

pub fn run_validate(args: ConfigArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating {}", args.config.display()));
    let config = super::session_config(Some(args.config.as_path()))?;
    log(level, LogLevel::Normal, "✓ Configuration is valid");
    log(level, LogLevel::Verbose, &format_session_summary(&config));
    Ok(())
}
