//! Session configuration: schema, loading and validation.

mod loader;
mod schema;
pub mod validate;

pub use loader::{from_yaml_str, load_config, to_yaml_string};
pub use schema::SessionConfig;
pub use validate::{validate_bridge, validate_config, validate_ensemble, ValidationError};
