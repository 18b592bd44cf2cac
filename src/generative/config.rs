//! Ensemble configuration.
//!
//! Defaults per family follow the playground presets: wide single-hidden-layer
//! networks, large latent spaces for the single-generator families and small
//! ones for the multi-generator families.

use serde::{Deserialize, Serialize};

use super::VariantKind;
use crate::optim::AdamConfig;

/// Configuration for one ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Unique name within a session
    pub name: String,
    /// GAN family
    pub variant: VariantKind,
    /// Noise dimension fed to each generator
    pub latent_dim: usize,
    /// Number of codes (InfoGAN) or generators / domains (DoPaNet, MAD-GAN)
    #[serde(default = "default_codes")]
    pub codes: usize,
    /// Generator hidden layers (at least one is always built)
    pub gen_layers: usize,
    /// Width of the first generator hidden layer; later layers double
    pub gen_start_dim: usize,
    /// Discriminator and classifier hidden layers (at least one)
    pub disc_layers: usize,
    /// Width of the first discriminator hidden layer; later layers halve
    pub disc_start_dim: usize,
    /// Real points sampled per iteration
    pub batch_size: usize,
    /// Weight of the classifier term in the generator loss
    #[serde(default = "default_q_weight")]
    pub q_weight: f32,
    /// Scale on the noise embedding of a code-conditioned generator
    #[serde(default = "default_latent_norm")]
    pub latent_norm: f32,
    pub generator_optimizer: AdamConfig,
    pub discriminator_optimizer: AdamConfig,
    #[serde(default)]
    pub classifier_optimizer: AdamConfig,
    /// Seed for weights and sampling; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Stop a training run after this many iterations
    #[serde(default)]
    pub iteration_limit: Option<u64>,
}

fn default_codes() -> usize {
    3
}

fn default_q_weight() -> f32 {
    1.0
}

fn default_latent_norm() -> f32 {
    0.25
}

/// Optimizer used for the generator side in the playground presets.
fn slow_adam() -> AdamConfig {
    AdamConfig { lr: 0.0001, beta1: 0.5, beta2: 0.5, ..AdamConfig::default() }
}

impl EnsembleConfig {
    pub fn vanilla() -> Self {
        Self {
            name: "vanilla".into(),
            variant: VariantKind::Vanilla,
            latent_dim: 100,
            codes: 1,
            gen_layers: 1,
            gen_start_dim: 1024,
            disc_layers: 1,
            disc_start_dim: 1024,
            batch_size: 64,
            q_weight: 0.0,
            latent_norm: default_latent_norm(),
            generator_optimizer: slow_adam(),
            discriminator_optimizer: AdamConfig::with_lr(0.0005),
            classifier_optimizer: AdamConfig::default(),
            seed: None,
            iteration_limit: None,
        }
    }

    pub fn info_gan() -> Self {
        Self {
            name: "infogan".into(),
            variant: VariantKind::InfoGan,
            latent_dim: 100,
            codes: 3,
            gen_layers: 0,
            gen_start_dim: 512,
            disc_layers: 1,
            disc_start_dim: 512,
            batch_size: 64,
            q_weight: 1.0,
            latent_norm: 0.25,
            generator_optimizer: slow_adam(),
            discriminator_optimizer: AdamConfig::with_lr(0.0005),
            classifier_optimizer: slow_adam(),
            seed: None,
            iteration_limit: None,
        }
    }

    pub fn dopanet() -> Self {
        Self {
            name: "dopanet".into(),
            variant: VariantKind::DoPaNet,
            latent_dim: 10,
            codes: 3,
            gen_layers: 1,
            gen_start_dim: 512,
            disc_layers: 1,
            disc_start_dim: 512,
            batch_size: 16,
            q_weight: 0.1,
            latent_norm: default_latent_norm(),
            generator_optimizer: AdamConfig::with_lr(0.0002),
            discriminator_optimizer: AdamConfig::with_lr(0.0005),
            classifier_optimizer: AdamConfig::with_lr(0.0002),
            seed: None,
            iteration_limit: None,
        }
    }

    pub fn madgan() -> Self {
        Self {
            name: "madgan".into(),
            variant: VariantKind::MadGan,
            latent_dim: 10,
            codes: 3,
            gen_layers: 0,
            gen_start_dim: 256,
            disc_layers: 1,
            disc_start_dim: 256,
            batch_size: 16,
            q_weight: 0.0,
            latent_norm: default_latent_norm(),
            generator_optimizer: AdamConfig::with_lr(0.0001),
            discriminator_optimizer: AdamConfig::with_lr(0.001),
            classifier_optimizer: AdamConfig::default(),
            seed: None,
            iteration_limit: None,
        }
    }

    /// Preset for a family.
    pub fn for_variant(variant: VariantKind) -> Self {
        match variant {
            VariantKind::Vanilla => Self::vanilla(),
            VariantKind::InfoGan => Self::info_gan(),
            VariantKind::DoPaNet => Self::dopanet(),
            VariantKind::MadGan => Self::madgan(),
        }
    }

    /// Same preset, much narrower, for tests and quick runs.
    pub fn small(variant: VariantKind) -> Self {
        Self {
            latent_dim: 8,
            gen_start_dim: 16,
            disc_start_dim: 16,
            batch_size: 16,
            seed: Some(42),
            ..Self::for_variant(variant)
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Generator hidden widths: `gen_start_dim * 2^i`, saturating.
    pub fn generator_widths(&self) -> Vec<usize> {
        (0..self.gen_layers.max(1))
            .map(|i| {
                u32::try_from(i)
                    .ok()
                    .and_then(|i| 1usize.checked_shl(i))
                    .and_then(|factor| self.gen_start_dim.checked_mul(factor))
                    .unwrap_or(usize::MAX)
            })
            .collect()
    }

    /// Discriminator hidden widths: `disc_start_dim / 2^i`, never below one.
    pub fn discriminator_widths(&self) -> Vec<usize> {
        (0..self.disc_layers.max(1))
            .map(|i| {
                u32::try_from(i)
                    .ok()
                    .and_then(|i| self.disc_start_dim.checked_shr(i))
                    .unwrap_or(0)
                    .max(1)
            })
            .collect()
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self::vanilla()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_match_variant() {
        for v in VariantKind::ALL {
            assert_eq!(EnsembleConfig::for_variant(v).variant, v);
            assert_eq!(EnsembleConfig::small(v).variant, v);
        }
    }

    #[test]
    fn test_widths() {
        let cfg = EnsembleConfig {
            gen_layers: 3,
            gen_start_dim: 8,
            disc_layers: 4,
            disc_start_dim: 4,
            ..EnsembleConfig::vanilla()
        };
        assert_eq!(cfg.generator_widths(), vec![8, 16, 32]);
        assert_eq!(cfg.discriminator_widths(), vec![4, 2, 1, 1]);
    }

    #[test]
    fn test_widths_never_overflow() {
        let cfg = EnsembleConfig {
            gen_layers: 70,
            gen_start_dim: 8,
            disc_layers: 70,
            disc_start_dim: 8,
            ..EnsembleConfig::vanilla()
        };
        let gen = cfg.generator_widths();
        assert_eq!(gen.len(), 70);
        assert_eq!(gen[3], 64);
        assert_eq!(gen[69], usize::MAX);
        let disc = cfg.discriminator_widths();
        assert_eq!(disc.len(), 70);
        assert!(disc[4..].iter().all(|&w| w == 1));
    }

    #[test]
    fn test_zero_layers_still_builds_one() {
        let cfg = EnsembleConfig::madgan();
        assert_eq!(cfg.gen_layers, 0);
        assert_eq!(cfg.generator_widths(), vec![256]);
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = r"
name: blobs
variant: dopanet
latent_dim: 4
gen_layers: 1
gen_start_dim: 16
disc_layers: 1
disc_start_dim: 16
batch_size: 8
generator_optimizer:
  lr: 0.0002
discriminator_optimizer:
  lr: 0.0005
";
        let cfg: EnsembleConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.codes, 3);
        assert_eq!(cfg.q_weight, 1.0);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.iteration_limit, None);
    }
}
