//! Adversario: a live training sandbox for toy 2-D GANs.
//!
//! Points painted into a [`SampleSource`] are the real data. An [`Ensemble`]
//! of small dense networks (vanilla GAN, InfoGAN, DoPaNet or MAD-GAN) trains
//! against them one iteration at a time, driven by a [`TrainingController`]
//! that can be toggled on and off at any moment. After every iteration a
//! [`Bridge`] pushes losses, scatter frames and decision surfaces to
//! whatever sinks are attached.
//!
//! # Architecture
//!
//! - `data`: points, the shared sample source and the brush
//! - `tensor`: counted iteration-scoped tensors
//! - `nn`: dense layers, activations, losses and the `Model` trait
//! - `optim`: Adam
//! - `generative`: ensembles, sub-models and the family descriptors
//! - `train`: the step engine and the loop controller
//! - `bridge`: loss history, surfaces and sinks
//! - `session`: ties one source to a set of ensembles
//! - `config`: YAML session files and validation
//! - `trace`: per-phase timing
//!
//! # Example
//!
//! ```no_run
//! use adversario::{Point, Session, SessionConfig};
//!
//! # async fn demo() -> adversario::Result<()> {
//! let mut session = Session::new(SessionConfig::default())?;
//! session.extend_points([Point::new(0.2, 0.2), Point::new(0.25, 0.18)]);
//! session.toggle_training().await?;
//! session.switch_active_ensemble("madgan").await?;
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod generative;
pub mod nn;
pub mod optim;
pub mod session;
pub mod tensor;
pub mod trace;
pub mod train;

pub use bridge::{Bridge, BridgeConfig, LossSink, PlotSink};
pub use config::SessionConfig;
pub use data::{Point, SampleSource};
pub use error::{Error, Result};
pub use generative::{Ensemble, EnsembleConfig, VariantKind};
pub use session::Session;
pub use train::{StepRecord, ToggleOutcome, TrainingController};
