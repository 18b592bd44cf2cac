//! Sub-model roles and the training phases that gate them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a sub-model does inside its ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Generator,
    Discriminator,
    /// Q-network (InfoGAN) or domain router (DoPaNet)
    Classifier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generator => f.write_str("generator"),
            Self::Discriminator => f.write_str("discriminator"),
            Self::Classifier => f.write_str("classifier"),
        }
    }
}

/// Optimisation phase of a training iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Discriminator,
    Generator,
}

impl Phase {
    /// Whether sub-models with `role` may be updated in this phase.
    pub fn unfreezes(self, role: Role) -> bool {
        matches!(
            (self, role),
            (Self::Discriminator, Role::Discriminator)
                | (Self::Generator, Role::Generator | Role::Classifier)
        )
    }
}

/// Trainability of `role` under an optional phase. Outside any phase
/// nothing is trainable.
pub fn is_trainable(phase: Option<Phase>, role: Role) -> bool {
    phase.is_some_and(|p| p.unfreezes(role))
}
