//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::validate_ensemble;
use crate::generative::{Ensemble, EnsembleConfig, VariantKind};
use proptest::prelude::*;

fn arb_variant() -> impl Strategy<Value = VariantKind> {
    prop::sample::select(VariantKind::ALL.to_vec())
}

fn arb_valid_ensemble() -> impl Strategy<Value = EnsembleConfig> {
    (
        arb_variant(),
        1usize..128,   // batch_size
        1usize..64,    // latent_dim
        1usize..8,     // codes
        1e-6f32..1.0,  // lr
        0.0f32..0.999, // beta1
    )
        .prop_map(|(variant, batch_size, latent_dim, codes, lr, beta1)| {
            let mut cfg = EnsembleConfig::small(variant);
            cfg.batch_size = batch_size;
            cfg.latent_dim = latent_dim;
            cfg.codes = codes;
            cfg.generator_optimizer.lr = lr;
            cfg.discriminator_optimizer.beta1 = beta1;
            cfg
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_ensemble_passes(cfg in arb_valid_ensemble()) {
        prop_assert!(validate_ensemble(&cfg).is_ok());
    }

    #[test]
    fn prop_zero_batch_size_fails(cfg in arb_valid_ensemble()) {
        let mut cfg = cfg;
        cfg.batch_size = 0;
        prop_assert!(matches!(
            validate_ensemble(&cfg),
            Err(ValidationError::InvalidBatchSize(0))
        ));
    }

    #[test]
    fn prop_lr_above_one_fails(cfg in arb_valid_ensemble(), high_lr in 1.01f32..10.0) {
        let mut cfg = cfg;
        cfg.discriminator_optimizer.lr = high_lr;
        prop_assert!(matches!(
            validate_ensemble(&cfg),
            Err(ValidationError::InvalidLearningRate { which: "discriminator", .. })
        ), "expected InvalidLearningRate for discriminator");
    }

    #[test]
    fn prop_excess_layers_rejected_without_panic(
        cfg in arb_valid_ensemble(),
        gen_layers in 0usize..200,
        disc_layers in 0usize..200,
    ) {
        let mut cfg = cfg;
        cfg.gen_layers = gen_layers;
        cfg.disc_layers = disc_layers;
        let accepted = validate_ensemble(&cfg).is_ok();
        prop_assert_eq!(accepted, gen_layers <= 8 && disc_layers <= 8);
        if !accepted {
            prop_assert!(Ensemble::new(cfg).is_err());
        }
    }
}
