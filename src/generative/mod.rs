//! GAN ensembles: the four families, their sub-models and construction.
//!
//! An [`Ensemble`] bundles generators, discriminators and an optional
//! auxiliary classifier. What differs between families (how many of each,
//! what the generator is conditioned on, how real points are routed, which
//! labels the discriminators learn) is captured by a [`VariantSpec`], so a
//! single step engine drives all of them.

mod buffers;
mod config;
mod ensemble;
mod role;
mod submodel;
mod variant;

pub use buffers::VisualBuffers;
pub use config::EnsembleConfig;
pub use ensemble::Ensemble;
pub use role::{is_trainable, Phase, Role};
pub use submodel::SubModel;
pub use variant::{Conditioning, Labelling, Routing, VariantKind, VariantSpec};
