//! Loading session files from disk.

use std::fs;
use std::path::Path;

use super::schema::SessionConfig;
use super::validate::validate_config;
use crate::error::{Error, Result};

/// Read, parse and validate a session file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SessionConfig> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    let config = from_yaml_str(&yaml)?;
    tracing::debug!(path = %path.display(), ensembles = config.ensembles.len(), "loaded session config");
    Ok(config)
}

/// Parse and validate a session from YAML text.
pub fn from_yaml_str(yaml: &str) -> Result<SessionConfig> {
    let config: SessionConfig = serde_yaml::from_str(yaml)?;
    validate_config(&config)?;
    Ok(config)
}

/// Serialize a session back to YAML.
pub fn to_yaml_string(config: &SessionConfig) -> Result<String> {
    Ok(serde_yaml::to_string(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generative::VariantKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SESSION: &str = r#"
active: modes
seed: 3
bridge:
  grid_size: 9
ensembles:
  - name: modes
    variant: madgan
    latent_dim: 4
    codes: 2
    gen_layers: 1
    gen_start_dim: 8
    disc_layers: 1
    disc_start_dim: 8
    batch_size: 16
    generator_optimizer: { lr: 0.001, beta1: 0.5, beta2: 0.9, epsilon: 1.0e-7 }
    discriminator_optimizer: { lr: 0.001, beta1: 0.5, beta2: 0.9, epsilon: 1.0e-7 }
"#;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SESSION.as_bytes()).unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.active_name(), Some("modes"));
        assert_eq!(cfg.bridge.grid_size, 9);
        assert_eq!(cfg.bridge.loss_history, 150);
        let modes = cfg.ensemble("modes").unwrap();
        assert_eq!(modes.variant, VariantKind::MadGan);
        assert_eq!(modes.codes, 2);
        assert_eq!(modes.q_weight, 1.0);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let cfg = from_yaml_str("{}").unwrap();
        assert_eq!(cfg.ensembles.len(), 4);
        assert_eq!(cfg.active, None);
        assert_eq!(cfg.active_name(), Some("vanilla"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_parse_error() {
        let err = from_yaml_str("ensembles: [ {name: x, variant: cyclegan} ]").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = SESSION.replace("batch_size: 16", "batch_size: 0");
        let err = from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_yaml_roundtrip_preserves_defaults() {
        let cfg = SessionConfig::default();
        let yaml = to_yaml_string(&cfg).unwrap();
        assert_eq!(from_yaml_str(&yaml).unwrap(), cfg);
    }
}
