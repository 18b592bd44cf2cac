//! Configuration validation
//!
//! Validates session and ensemble configurations before anything is built.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::{validate_bridge, validate_config, validate_ensemble};
