use std::sync::{Arc, Mutex};

use super::*;
use crate::data::{Point, SampleSource};
use crate::generative::{EnsembleConfig, VariantKind};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Recorded {
    surfaces: Vec<String>,
    fields: Vec<String>,
    scatters: usize,
    losses: Vec<(String, u64)>,
    clears: usize,
}

/// Sink that records calls into shared state, optionally failing them.
#[derive(Clone, Default)]
struct RecordingSink {
    state: Arc<Mutex<Recorded>>,
    fail: bool,
}

impl RecordingSink {
    fn check(&self) -> Result<()> {
        if self.fail {
            Err(Error::Sink("unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl PlotSink for RecordingSink {
    fn update_decision_surface(&mut self, frame: &SurfaceFrame) -> Result<()> {
        self.state.lock().unwrap().surfaces.push(frame.name.clone());
        self.check()
    }

    fn update_gradient_field(&mut self, frame: &GradientFrame) -> Result<()> {
        self.state.lock().unwrap().fields.push(frame.name.clone());
        self.check()
    }

    fn update_scatter(&mut self, _frame: &ScatterFrame) -> Result<()> {
        self.state.lock().unwrap().scatters += 1;
        self.check()
    }
}

impl LossSink for RecordingSink {
    fn push_loss_sample(&mut self, series: &str, iteration: u64, _value: f32) -> Result<()> {
        self.state.lock().unwrap().losses.push((series.to_string(), iteration));
        self.check()
    }

    fn clear(&mut self) -> Result<()> {
        self.state.lock().unwrap().clears += 1;
        self.check()
    }
}

fn source() -> SampleSource {
    SampleSource::from_points((0..20).map(|i| Point::new(0.2 + i as f32 * 0.001, 0.2)))
}

async fn stepped(variant: VariantKind) -> (Ensemble, StepRecord) {
    let mut ensemble = Ensemble::new(EnsembleConfig::small(variant)).unwrap();
    let record = ensemble.train_step(&source()).await.unwrap();
    (ensemble, record)
}

#[tokio::test]
async fn test_publish_reaches_all_sinks() {
    let (ensemble, record) = stepped(VariantKind::DoPaNet).await;
    let sink = RecordingSink::default();
    let mut bridge = Bridge::new(BridgeConfig { grid_size: 4, ..BridgeConfig::default() })
        .with_plot_sink(sink.clone())
        .with_loss_sink(sink.clone());
    bridge.publish(&record, &ensemble);

    let state = sink.state.lock().unwrap();
    assert_eq!(state.scatters, 1);
    assert!(state.surfaces.contains(&"classifier 1".to_string()));
    assert!(state.fields.contains(&"discriminator 2".to_string()));
    assert!(state.losses.iter().any(|(s, i)| s == "generator 2 loss" && *i == 1));
    assert_eq!(bridge.failures(), 0);
    assert!(bridge.history().len("generator loss") == 1);
}

#[tokio::test]
async fn test_surface_cadence() {
    let (ensemble, mut record) = stepped(VariantKind::Vanilla).await;
    let sink = RecordingSink::default();
    let mut bridge = Bridge::new(BridgeConfig { grid_size: 3, surface_every: 2, ..BridgeConfig::default() })
        .with_plot_sink(sink.clone());
    for iteration in 1..=4 {
        record.iteration = iteration;
        bridge.publish(&record, &ensemble);
    }
    let state = sink.state.lock().unwrap();
    assert_eq!(state.scatters, 4);
    assert_eq!(state.surfaces.len(), 2);
}

#[tokio::test]
async fn test_failing_sink_is_counted_not_fatal() {
    let (ensemble, record) = stepped(VariantKind::Vanilla).await;
    let sink = RecordingSink { fail: true, ..RecordingSink::default() };
    let mut bridge = Bridge::new(BridgeConfig { grid_size: 3, ..BridgeConfig::default() })
        .with_plot_sink(sink.clone())
        .with_loss_sink(sink);
    bridge.publish(&record, &ensemble);
    // two losses, one scatter, one surface, one field
    assert_eq!(bridge.failures(), 5);
    assert_eq!(bridge.history().len("discriminator loss"), 1);
}

#[tokio::test]
async fn test_clear_losses() {
    let (ensemble, record) = stepped(VariantKind::Vanilla).await;
    let sink = RecordingSink::default();
    let mut bridge = Bridge::new(BridgeConfig::default()).with_loss_sink(sink.clone());
    bridge.publish(&record, &ensemble);
    bridge.clear_losses();
    assert!(bridge.history().is_empty());
    assert_eq!(sink.state.lock().unwrap().clears, 1);
}

#[tokio::test]
async fn test_scatter_frame_classes() {
    let (ensemble, _) = stepped(VariantKind::MadGan).await;
    let frame = scatter_frame(&ensemble, 1);
    assert_eq!(frame.real.len(), 16);
    assert_eq!(frame.fake.len(), 3 * 16);
    assert_eq!(frame.fake_classes.len(), frame.fake.len());
    assert_eq!(frame.fake_classes[16], 1);

    let (ensemble, _) = stepped(VariantKind::InfoGan).await;
    let frame = scatter_frame(&ensemble, 1);
    assert_eq!(frame.fake_classes.len(), 16);
    assert!(frame.fake_classes.iter().all(|&c| c < 3));

    let (ensemble, _) = stepped(VariantKind::DoPaNet).await;
    let frame = scatter_frame(&ensemble, 1);
    assert_eq!(frame.real_classes.len(), 16);
}

#[tokio::test]
async fn test_channel_sink_end_to_end() {
    let (ensemble, record) = stepped(VariantKind::Vanilla).await;
    let (sink, mut rx) = frame_channel(64);
    let mut bridge = Bridge::new(BridgeConfig { grid_size: 3, ..BridgeConfig::default() })
        .with_plot_sink(sink.clone())
        .with_loss_sink(sink);
    bridge.publish(&record, &ensemble);
    let mut kinds = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        kinds.push(match frame {
            Frame::Loss { .. } => "loss",
            Frame::Scatter(_) => "scatter",
            Frame::Surface(_) => "surface",
            Frame::Gradient(_) => "gradient",
            Frame::ClearLosses => "clear",
        });
    }
    assert_eq!(kinds, vec!["loss", "loss", "scatter", "surface", "gradient"]);
}
