//! Optimizers for sub-model parameters.

mod adam;
mod optimizer;

pub use adam::{Adam, AdamConfig};
pub use optimizer::Optimizer;
