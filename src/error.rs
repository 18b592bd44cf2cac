//! Error types for the sandbox.
//!
//! Every fallible operation in the crate returns [`Result`]. The messages are
//! written to be shown to the person driving the sandbox, so they say what to
//! do next where that is obvious.

use std::path::PathBuf;

use crate::config::ValidationError;

/// Sandbox error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Sample source is empty: paint some points before training")]
    EmptySource,

    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { context: &'static str, expected: Vec<usize>, actual: Vec<usize> },

    #[error("Unknown ensemble: {0}")]
    UnknownEnsemble(String),

    #[error("No active ensemble selected")]
    NoActiveEnsemble,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink rejected frame: {0}")]
    Sink(String),

    #[error("Training task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    /// Short machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySource => "E001",
            Self::ShapeMismatch { .. } => "E002",
            Self::UnknownEnsemble(_) => "E003",
            Self::NoActiveEnsemble => "E004",
            Self::InvalidConfig(_) => "E005",
            Self::ConfigParse(_) => "E006",
            Self::Io { .. } => "E007",
            Self::Sink(_) => "E008",
            Self::TaskFailed(_) => "E009",
        }
    }

    /// Whether the user can fix this by changing input or configuration.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::EmptySource
                | Self::UnknownEnsemble(_)
                | Self::NoActiveEnsemble
                | Self::InvalidConfig(_)
                | Self::ConfigParse(_)
        )
    }

    pub(crate) fn shape(context: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch { context, expected: expected.to_vec(), actual: actual.to_vec() }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
