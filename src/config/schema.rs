//! YAML schema for a sandbox session
//!
//! A session file lists the ensembles to offer, which one starts active, and
//! how the bridge publishes. Every section may be omitted.

use serde::{Deserialize, Serialize};

use crate::bridge::BridgeConfig;
use crate::generative::{EnsembleConfig, VariantKind};

/// Complete session specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Ensemble selected on start; the first listed one when absent
    #[serde(default)]
    pub active: Option<String>,

    /// Seed applied to every ensemble that does not set its own
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default = "default_ensembles")]
    pub ensembles: Vec<EnsembleConfig>,
}

fn default_ensembles() -> Vec<EnsembleConfig> {
    VariantKind::ALL.into_iter().map(EnsembleConfig::for_variant).collect()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active: Some(VariantKind::Vanilla.to_string()),
            seed: None,
            bridge: BridgeConfig::default(),
            ensembles: default_ensembles(),
        }
    }
}

impl SessionConfig {
    /// Name of the ensemble to select first.
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref().or_else(|| self.ensembles.first().map(|e| e.name.as_str()))
    }

    /// Look up an ensemble by name.
    pub fn ensemble(&self, name: &str) -> Option<&EnsembleConfig> {
        self.ensembles.iter().find(|e| e.name == name)
    }

    /// Ensemble configurations with the session seed filled in.
    pub fn resolved_ensembles(&self) -> impl Iterator<Item = EnsembleConfig> + '_ {
        self.ensembles.iter().enumerate().map(|(i, e)| {
            let mut e = e.clone();
            if e.seed.is_none() {
                // Offset per slot so sibling ensembles do not mirror each other.
                e.seed = self.seed.map(|s| s.wrapping_add(i as u64));
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offers_every_variant() {
        let cfg = SessionConfig::default();
        let names: Vec<_> = cfg.ensembles.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["vanilla", "infogan", "dopanet", "madgan"]);
        assert_eq!(cfg.active_name(), Some("vanilla"));
    }

    #[test]
    fn test_active_falls_back_to_first() {
        let cfg = SessionConfig {
            active: None,
            ensembles: vec![EnsembleConfig::madgan()],
            ..SessionConfig::default()
        };
        assert_eq!(cfg.active_name(), Some("madgan"));
    }

    #[test]
    fn test_session_seed_fills_missing_seeds() {
        let cfg = SessionConfig {
            seed: Some(7),
            ensembles: vec![EnsembleConfig::vanilla(), EnsembleConfig::small(VariantKind::MadGan)],
            ..SessionConfig::default()
        };
        let seeds: Vec<_> = cfg.resolved_ensembles().map(|e| e.seed).collect();
        assert_eq!(seeds, [Some(7), Some(42)]);
    }
}
