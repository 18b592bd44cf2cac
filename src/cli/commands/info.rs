//! Info command implementation

use crate::cli::logging::log;
use crate::cli::{InfoArgs, LogLevel, OutputFormat};
use crate::config::{to_yaml_string, SessionConfig};
use crate::generative::Ensemble;

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let config = super::session_config(args.config.as_deref())?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Session Info:");
            println!();
            println!("{}", format_info(&config)?);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config).map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = to_yaml_string(&config).map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}

/// Human-readable description of every ensemble, with parameter counts.
pub fn format_info(config: &SessionConfig) -> Result<String, String> {
    let mut lines = vec![
        format!("Active: {}", config.active_name().unwrap_or("-")),
        format!(
            "Bridge: {0}x{0} grid, surfaces every {1} iteration(s), {2} loss samples",
            config.bridge.grid_size, config.bridge.surface_every, config.bridge.loss_history
        ),
    ];
    for ensemble_config in &config.ensembles {
        let ensemble = Ensemble::new(ensemble_config.clone()).map_err(|e| e.to_string())?;
        lines.push(String::new());
        lines.push(format!("{} ({})", ensemble.name(), ensemble_config.variant));
        for model in ensemble.sub_models() {
            let params: usize = model.parameter_shapes().iter().map(|s| s.iter().product::<usize>()).sum();
            lines.push(format!("  {:<16} {:>8} parameters", model.name(), params));
        }
    }
    Ok(lines.join("\n"))
}
