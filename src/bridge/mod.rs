//! Hands training output to plotting code.
//!
//! After every iteration the [`Bridge`] pushes loss samples, then a scatter
//! frame copied from the ensemble's visual buffers, then (every
//! `surface_every` iterations) decision surfaces and gradient fields over a
//! fixed grid. Sink failures are logged and otherwise ignored.

mod channel;
mod history;
mod rate;
mod sink;
mod surface;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use channel::{frame_channel, ChannelSink, Frame};
pub use history::{sparkline, LossHistory, DEFAULT_HISTORY};
pub use rate::FrameRate;
pub use sink::{GradientFrame, LossSink, PlotSink, ScatterFrame, SurfaceFrame};
pub use surface::{ensemble_surfaces, Grid};

use crate::generative::{Conditioning, Ensemble};
use crate::train::{labelled_fakes, StepRecord};

/// Publishing settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Grid side length for surfaces and gradient fields
    pub grid_size: usize,
    /// Publish surfaces every this many iterations
    pub surface_every: u64,
    /// Loss samples kept per series
    pub loss_history: usize,
    /// Frames buffered by a channel sink before dropping
    pub channel_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { grid_size: 15, surface_every: 1, loss_history: DEFAULT_HISTORY, channel_capacity: 64 }
    }
}

/// Publisher for one ensemble.
pub struct Bridge {
    config: BridgeConfig,
    grid: Grid,
    history: LossHistory,
    plot: Option<Box<dyn PlotSink>>,
    loss: Option<Box<dyn LossSink>>,
    rate: FrameRate,
    failures: u64,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("plot_sink", &self.plot.is_some())
            .field("loss_sink", &self.loss.is_some())
            .field("failures", &self.failures)
            .finish()
    }
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            grid: Grid::new(config.grid_size),
            history: LossHistory::new(config.loss_history),
            config,
            plot: None,
            loss: None,
            rate: FrameRate::default(),
            failures: 0,
        }
    }

    #[must_use]
    pub fn with_plot_sink(mut self, sink: impl PlotSink + 'static) -> Self {
        self.plot = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn with_loss_sink(mut self, sink: impl LossSink + 'static) -> Self {
        self.loss = Some(Box::new(sink));
        self
    }

    pub fn set_plot_sink(&mut self, sink: Box<dyn PlotSink>) {
        self.plot = Some(sink);
    }

    pub fn set_loss_sink(&mut self, sink: Box<dyn LossSink>) {
        self.loss = Some(sink);
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Loss history kept regardless of attached sinks.
    pub fn history(&self) -> &LossHistory {
        &self.history
    }

    /// Sink calls that returned an error so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn report(&mut self, what: &str, result: crate::Result<()>) {
        if let Err(e) = result {
            self.failures += 1;
            tracing::warn!(sink = what, error = %e, "sink update failed");
        }
    }

    /// Push everything for one finished iteration.
    pub fn publish(&mut self, record: &StepRecord, ensemble: &Ensemble) {
        let iteration = record.iteration;
        for (series, value) in record.loss_samples() {
            self.history.record(&series, iteration, value);
            if let Some(sink) = self.loss.as_mut() {
                let result = sink.push_loss_sample(&series, iteration, value);
                self.report("loss", result);
            }
        }

        if self.plot.is_some() {
            let scatter = scatter_frame(ensemble, iteration);
            let result = self.plot.as_mut().map_or(Ok(()), |p| p.update_scatter(&scatter));
            self.report("scatter", result);

            if iteration % self.config.surface_every.max(1) == 0 {
                self.publish_surfaces(ensemble, iteration);
            }
        }

        if let Some(fps) = self.rate.tick() {
            tracing::debug!(ensemble = %ensemble.name(), fps, "publish rate");
        }
    }

    fn publish_surfaces(&mut self, ensemble: &Ensemble, iteration: u64) {
        let (surfaces, fields) = match ensemble_surfaces(ensemble, &self.grid, iteration) {
            Ok(frames) => frames,
            Err(e) => {
                self.report("surface", Err(e));
                return;
            }
        };
        let mut results = Vec::with_capacity(surfaces.len() + fields.len());
        if let Some(plot) = self.plot.as_mut() {
            results.extend(surfaces.iter().map(|s| plot.update_decision_surface(s)));
            results.extend(fields.iter().map(|f| plot.update_gradient_field(f)));
        }
        for result in results {
            self.report("surface", result);
        }
    }

    /// Clear the kept history and tell the loss sink to do the same.
    pub fn clear_losses(&mut self) {
        self.history.clear();
        if let Some(sink) = self.loss.as_mut() {
            let result = sink.clear();
            self.report("loss", result);
        }
    }
}

/// Scatter frame from the ensemble's current buffers.
pub fn scatter_frame(ensemble: &Ensemble, iteration: u64) -> ScatterFrame {
    let buffers = ensemble.buffers();
    let labelled = labelled_fakes(ensemble);
    let fake_classes = match ensemble.spec().conditioning {
        Conditioning::SampledCode { .. } => buffers.codes.clone(),
        Conditioning::GeneratorIndex => labelled.iter().map(|&(g, _)| g).collect(),
        Conditioning::None => Vec::new(),
    };
    ScatterFrame {
        iteration,
        real: buffers.real.clone(),
        real_classes: buffers.real_routes.clone(),
        fake: labelled.into_iter().map(|(_, p)| p).collect(),
        fake_classes,
    }
}

#[cfg(test)]
mod tests;
