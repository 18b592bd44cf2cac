//! Small dense-network toolkit used by the sub-models.
//!
//! Networks are batch-first: inputs are `batch × features` arrays. Every
//! network implements [`Model`], which is the only surface the rest of the
//! crate uses.

mod activation;
mod conditional;
mod dense;
mod init;
mod loss;
mod network;
mod sequential;

pub use activation::Activation;
pub use conditional::{ConditionalCache, ConditionalGenerator};
pub use dense::{Dense, DenseCache};
pub use init::glorot_normal;
pub use loss::{BinaryCrossEntropy, CategoricalCrossEntropy, LossFn, LOSS_EPSILON};
pub use network::{Model, Network, NetworkCache};
pub use sequential::Sequential;

/// Per-parameter gradients, in the same order as [`Model::parameters`].
pub type Gradients = Vec<ndarray::Array2<f32>>;
