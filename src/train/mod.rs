//! Training: the per-iteration step engine and the loop around it.

mod controller;
mod record;
mod routing;
mod step;

pub use controller::{LoopPhase, ToggleOutcome, TrainingController, TrainingRig};
pub use record::StepRecord;
pub use routing::{broadcast, partition_by_route};
pub use step::{labelled_fakes, routed_counts};
