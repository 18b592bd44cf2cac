//! The sandbox session: one sample source shared by a set of ensembles, of
//! which exactly one is active at a time.
//!
//! Ensembles are built on first use. Switching the active ensemble stops the
//! previous one's training loop and waits for it, so two loops never run at
//! once.

use std::collections::BTreeMap;

use crate::bridge::{Bridge, BridgeConfig, LossSink, PlotSink};
use crate::config::{validate_config, SessionConfig};
use crate::data::{Point, SampleSource};
use crate::generative::{Ensemble, EnsembleConfig};
use crate::train::{ToggleOutcome, TrainingController, TrainingRig};
use crate::{Error, Result};

struct Slot {
    config: EnsembleConfig,
    controller: Option<TrainingController>,
    plot: Option<Box<dyn PlotSink>>,
    loss: Option<Box<dyn LossSink>>,
}

impl Slot {
    fn new(config: EnsembleConfig) -> Self {
        Self { config, controller: None, plot: None, loss: None }
    }

    fn build(&mut self, source: &SampleSource, bridge_config: BridgeConfig) -> Result<&TrainingController> {
        if self.controller.is_none() {
            let ensemble = Ensemble::new(self.config.clone())?;
            let mut bridge = Bridge::new(bridge_config);
            if let Some(plot) = self.plot.take() {
                bridge.set_plot_sink(plot);
            }
            if let Some(loss) = self.loss.take() {
                bridge.set_loss_sink(loss);
            }
            tracing::info!(ensemble = %self.config.name, variant = %self.config.variant, "ensemble ready");
            self.controller = Some(TrainingController::new(TrainingRig::new(ensemble, bridge), source.clone()));
        }
        self.controller.as_ref().ok_or(Error::NoActiveEnsemble)
    }
}

/// Explicit context for everything the sandbox does.
pub struct Session {
    source: SampleSource,
    slots: BTreeMap<String, Slot>,
    order: Vec<String>,
    active: Option<String>,
    bridge_config: BridgeConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("points", &self.source.len())
            .field("ensembles", &self.order)
            .field("active", &self.active)
            .finish()
    }
}

impl Session {
    /// Validate `config` and set up one slot per ensemble. Nothing is built yet.
    pub fn new(config: SessionConfig) -> Result<Self> {
        validate_config(&config)?;
        let active = config.active_name().map(str::to_string);
        let mut slots = BTreeMap::new();
        let mut order = Vec::with_capacity(config.ensembles.len());
        for ensemble in config.resolved_ensembles() {
            order.push(ensemble.name.clone());
            slots.insert(ensemble.name.clone(), Slot::new(ensemble));
        }
        Ok(Self { source: SampleSource::new(), slots, order, active, bridge_config: config.bridge })
    }

    /// Handle on the shared sample source.
    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    pub fn append_point(&self, point: Point) {
        self.source.append(point);
    }

    pub fn extend_points(&self, points: impl IntoIterator<Item = Point>) {
        self.source.extend(points);
    }

    /// Ensemble names in configuration order.
    pub fn ensemble_names(&self) -> &[String] {
        &self.order
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Controller of `name`, if that ensemble has been built.
    pub fn controller(&self, name: &str) -> Option<&TrainingController> {
        self.slots.get(name).and_then(|slot| slot.controller.as_ref())
    }

    /// Controller of the active ensemble, building it if needed.
    pub fn active_controller(&mut self) -> Result<&TrainingController> {
        let name = self.active.clone().ok_or(Error::NoActiveEnsemble)?;
        self.build(&name)
    }

    fn build(&mut self, name: &str) -> Result<&TrainingController> {
        let slot = self.slots.get_mut(name).ok_or_else(|| Error::UnknownEnsemble(name.to_string()))?;
        slot.build(&self.source, self.bridge_config)
    }

    /// Build every ensemble now rather than on first use.
    pub fn build_all(&mut self) -> Result<()> {
        for slot in self.slots.values_mut() {
            slot.build(&self.source, self.bridge_config)?;
        }
        Ok(())
    }

    /// Route plots of `name` to `sink`. Takes effect between iterations.
    pub async fn attach_plot_sink(&mut self, name: &str, sink: impl PlotSink + 'static) -> Result<()> {
        let slot = self.slots.get_mut(name).ok_or_else(|| Error::UnknownEnsemble(name.to_string()))?;
        match &slot.controller {
            Some(controller) => controller.rig().lock().await.bridge.set_plot_sink(Box::new(sink)),
            None => slot.plot = Some(Box::new(sink)),
        }
        Ok(())
    }

    /// Route loss samples of `name` to `sink`. Takes effect between iterations.
    pub async fn attach_loss_sink(&mut self, name: &str, sink: impl LossSink + 'static) -> Result<()> {
        let slot = self.slots.get_mut(name).ok_or_else(|| Error::UnknownEnsemble(name.to_string()))?;
        match &slot.controller {
            Some(controller) => controller.rig().lock().await.bridge.set_loss_sink(Box::new(sink)),
            None => slot.loss = Some(Box::new(sink)),
        }
        Ok(())
    }

    /// Start or stop training of the active ensemble.
    pub async fn toggle_training(&mut self) -> Result<ToggleOutcome> {
        self.active_controller()?.toggle()
    }

    /// Redraw the active ensemble's weights and clear its loss history.
    /// Waits for an in-flight iteration; a running loop keeps going.
    pub async fn reset_weights(&mut self) -> Result<()> {
        let controller = self.active_controller()?;
        controller.rig().lock().await.reset();
        Ok(())
    }

    /// Make `name` the active ensemble. A running loop on the previous one is
    /// stopped and awaited first.
    pub async fn switch_active_ensemble(&mut self, name: &str) -> Result<()> {
        if !self.slots.contains_key(name) {
            return Err(Error::UnknownEnsemble(name.to_string()));
        }
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }
        if let Some(previous) = self.active.as_deref().and_then(|n| self.controller(n)) {
            previous.stop().await?;
        }
        tracing::info!(from = ?self.active, to = name, "switched ensemble");
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Stop the active loop, drop every point and blank every visual buffer.
    pub async fn clear(&mut self) -> Result<()> {
        if let Some(active) = self.active.as_deref().and_then(|n| self.controller(n)) {
            active.stop().await?;
        }
        self.source.clear();
        for controller in self.slots.values().filter_map(|s| s.controller.as_ref()) {
            controller.rig().lock().await.ensemble.clear_buffers();
        }
        tracing::info!("session cleared");
        Ok(())
    }

    /// Stop every loop and wait for all of them.
    pub async fn shutdown(&self) -> Result<()> {
        for controller in self.slots.values().filter_map(|s| s.controller.as_ref()) {
            controller.stop().await?;
        }
        Ok(())
    }
}
