//! Configuration validation logic
//!
//! Checks ranges before anything is built, so a bad file fails at load time
//! rather than as a NaN halfway through a run.

use std::collections::BTreeSet;

use super::error::ValidationError;
use crate::bridge::BridgeConfig;
use crate::config::SessionConfig;
use crate::generative::EnsembleConfig;
use crate::optim::AdamConfig;

/// Upper bound on codes and domains; the one-hot layers grow with it.
const MAX_CODES: usize = 64;
const MAX_GRID: usize = 256;
/// Hidden layers per network. Generator widths double per layer.
const MAX_LAYERS: usize = 8;
/// Widest hidden layer any network may ask for.
const MAX_WIDTH: usize = 4096;

/// Validate a whole session configuration.
pub fn validate_config(config: &SessionConfig) -> Result<(), ValidationError> {
    if config.ensembles.is_empty() {
        return Err(ValidationError::NoEnsembles);
    }

    let mut seen = BTreeSet::new();
    for ensemble in &config.ensembles {
        validate_ensemble(ensemble)?;
        if !seen.insert(ensemble.name.as_str()) {
            return Err(ValidationError::DuplicateName(ensemble.name.clone()));
        }
    }

    if let Some(active) = &config.active {
        if !seen.contains(active.as_str()) {
            return Err(ValidationError::UnknownActive(active.clone()));
        }
    }

    validate_bridge(&config.bridge)
}

/// Validate one ensemble.
pub fn validate_ensemble(config: &EnsembleConfig) -> Result<(), ValidationError> {
    if config.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if config.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(config.batch_size));
    }
    if config.latent_dim == 0 {
        return Err(ValidationError::InvalidLatentDim(config.latent_dim));
    }
    if config.codes == 0 || config.codes > MAX_CODES {
        return Err(ValidationError::InvalidCodes(config.codes));
    }
    if config.gen_layers > MAX_LAYERS {
        return Err(ValidationError::InvalidLayers { which: "generator", value: config.gen_layers });
    }
    if config.disc_layers > MAX_LAYERS {
        return Err(ValidationError::InvalidLayers { which: "discriminator", value: config.disc_layers });
    }
    let widest = config.generator_widths().last().copied().unwrap_or(config.gen_start_dim);
    if config.gen_start_dim == 0 || widest > MAX_WIDTH {
        return Err(ValidationError::InvalidWidth { which: "generator", value: widest });
    }
    if config.disc_start_dim == 0 || config.disc_start_dim > MAX_WIDTH {
        return Err(ValidationError::InvalidWidth { which: "discriminator", value: config.disc_start_dim });
    }
    if !config.q_weight.is_finite() || config.q_weight < 0.0 {
        return Err(ValidationError::InvalidQWeight(config.q_weight));
    }
    if !config.latent_norm.is_finite() || config.latent_norm <= 0.0 {
        return Err(ValidationError::InvalidLatentNorm(config.latent_norm));
    }
    if config.iteration_limit == Some(0) {
        return Err(ValidationError::InvalidIterationLimit);
    }

    validate_optimizer("generator", &config.generator_optimizer)?;
    validate_optimizer("discriminator", &config.discriminator_optimizer)?;
    validate_optimizer("classifier", &config.classifier_optimizer)
}

fn validate_optimizer(which: &'static str, adam: &AdamConfig) -> Result<(), ValidationError> {
    // Also rejects NaN.
    if !(adam.lr > 0.0 && adam.lr <= 1.0) {
        return Err(ValidationError::InvalidLearningRate { which, value: adam.lr });
    }
    for beta in [adam.beta1, adam.beta2] {
        if !(0.0..1.0).contains(&beta) {
            return Err(ValidationError::InvalidBeta { which, value: beta });
        }
    }
    if !(adam.epsilon > 0.0) {
        return Err(ValidationError::InvalidEpsilon { which, value: adam.epsilon });
    }
    Ok(())
}

/// Validate publishing settings.
pub fn validate_bridge(config: &BridgeConfig) -> Result<(), ValidationError> {
    if !(2..=MAX_GRID).contains(&config.grid_size) {
        return Err(ValidationError::InvalidGridSize(config.grid_size));
    }
    if config.surface_every == 0 {
        return Err(ValidationError::InvalidSurfaceEvery);
    }
    if config.loss_history == 0 {
        return Err(ValidationError::InvalidLossHistory(config.loss_history));
    }
    if config.channel_capacity == 0 {
        return Err(ValidationError::InvalidChannelCapacity(config.channel_capacity));
    }
    Ok(())
}
