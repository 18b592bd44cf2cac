//! Validation error types
//!
//! Every variant names the offending value so the message alone is enough to
//! fix the file.

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Ensemble name cannot be empty")]
    EmptyName,

    #[error("Duplicate ensemble name: {0}")]
    DuplicateName(String),

    #[error("No ensembles configured")]
    NoEnsembles,

    #[error("Active ensemble '{0}' is not configured")]
    UnknownActive(String),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid latent dimension: {0} (must be > 0)")]
    InvalidLatentDim(usize),

    #[error("Invalid code count: {0} (must be between 1 and 64)")]
    InvalidCodes(usize),

    #[error("Invalid {which} layer count: {value} (must be at most 8)")]
    InvalidLayers { which: &'static str, value: usize },

    #[error("Invalid {which} width: {value} (must be between 1 and 4096)")]
    InvalidWidth { which: &'static str, value: usize },

    #[error("Invalid learning rate for {which}: {value} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate { which: &'static str, value: f32 },

    #[error("Invalid beta for {which}: {value} (must be in [0.0, 1.0))")]
    InvalidBeta { which: &'static str, value: f32 },

    #[error("Invalid epsilon for {which}: {value} (must be > 0.0)")]
    InvalidEpsilon { which: &'static str, value: f32 },

    #[error("Invalid classifier weight: {0} (must be finite and >= 0.0)")]
    InvalidQWeight(f32),

    #[error("Invalid latent norm: {0} (must be finite and > 0.0)")]
    InvalidLatentNorm(f32),

    #[error("Invalid iteration limit: 0 (omit it to train without a limit)")]
    InvalidIterationLimit,

    #[error("Invalid grid size: {0} (must be between 2 and 256)")]
    InvalidGridSize(usize),

    #[error("Invalid surface cadence: 0 (must publish every >= 1 iterations)")]
    InvalidSurfaceEvery,

    #[error("Invalid loss history: {0} (must be > 0)")]
    InvalidLossHistory(usize),

    #[error("Invalid channel capacity: {0} (must be > 0)")]
    InvalidChannelCapacity(usize),
}
