//! Frames handed to plotting code, and the sink traits that receive them.

use serde::Serialize;

use crate::data::Point;
use crate::Result;

/// Scalar field sampled on the grid, e.g. a discriminator's output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceFrame {
    /// Plot name, e.g. "discriminator" or "classifier 2"
    pub name: String,
    pub iteration: u64,
    /// Side length of the square grid
    pub size: usize,
    /// `size * size` values, x varying fastest
    pub values: Vec<f32>,
}

/// Input gradient of a surface at every grid node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientFrame {
    pub name: String,
    pub iteration: u64,
    pub positions: Vec<Point>,
    pub vectors: Vec<Point>,
}

/// Latest real and fake samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScatterFrame {
    pub iteration: u64,
    pub real: Vec<Point>,
    /// Route of each real point (empty without routing)
    pub real_classes: Vec<usize>,
    pub fake: Vec<Point>,
    /// Generator index or sampled code of each fake (empty for a lone
    /// unconditioned generator)
    pub fake_classes: Vec<usize>,
}

/// Receives plot updates. Errors are reported, never fatal to training.
pub trait PlotSink: Send {
    fn update_decision_surface(&mut self, frame: &SurfaceFrame) -> Result<()>;

    fn update_gradient_field(&mut self, frame: &GradientFrame) -> Result<()>;

    fn update_scatter(&mut self, frame: &ScatterFrame) -> Result<()>;
}

/// Receives loss samples under semantic series names.
pub trait LossSink: Send {
    fn push_loss_sample(&mut self, series: &str, iteration: u64, value: f32) -> Result<()>;

    /// Forget every series, e.g. after a weight reset.
    fn clear(&mut self) -> Result<()>;
}
