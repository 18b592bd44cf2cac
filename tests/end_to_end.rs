//! End-to-end training runs through the public API

use adversario::bridge::{frame_channel, Frame};
use adversario::generative::{Ensemble, EnsembleConfig, VariantKind};
use adversario::{Point, SampleSource};

fn cluster_near(x: f32, y: f32, n: usize) -> SampleSource {
    SampleSource::from_points((0..n).map(|i| {
        let t = i as f32 / n as f32;
        Point::new(x + 0.03 * (t * 6.28).cos(), y + 0.03 * (t * 6.28).sin())
    }))
}

#[tokio::test]
async fn test_vanilla_two_hundred_iterations_is_finite() {
    let source = cluster_near(0.2, 0.2, 50);
    let config = EnsembleConfig {
        latent_dim: 8,
        batch_size: 16,
        seed: Some(2024),
        ..EnsembleConfig::vanilla()
    };
    let mut ensemble = Ensemble::new(config).expect("config should be valid");

    let mut last = 0;
    for _ in 0..200 {
        let record = ensemble.train_step(&source).await.expect("step should succeed");
        assert_eq!(record.iteration, last + 1);
        assert!(record.is_finite(), "non-finite loss at {}", record.iteration);
        assert_eq!(record.live_tensors, 0);
        last = record.iteration;
    }
}

#[tokio::test]
async fn test_same_seed_same_run() {
    let source = cluster_near(-0.3, 0.1, 30);
    let mut a = Ensemble::new(EnsembleConfig::small(VariantKind::InfoGan)).unwrap();
    let mut b = Ensemble::new(EnsembleConfig::small(VariantKind::InfoGan)).unwrap();
    for _ in 0..10 {
        let ra = a.train_step(&source).await.unwrap();
        let rb = b.train_step(&source).await.unwrap();
        assert_eq!(ra, rb);
    }
}

#[tokio::test]
async fn test_generate_does_not_touch_buffers() {
    let source = cluster_near(0.0, 0.0, 20);
    let mut ensemble = Ensemble::new(EnsembleConfig::small(VariantKind::MadGan)).unwrap();
    ensemble.train_step(&source).await.unwrap();
    let snapshot = ensemble.buffers().fakes.clone();

    let samples = ensemble.generate(7).unwrap();
    assert_eq!(samples.len(), 7);
    assert!(samples.iter().all(Point::is_finite));
    assert_eq!(ensemble.buffers().fakes, snapshot);
}

#[tokio::test]
async fn test_channel_receives_frames_in_order() {
    use adversario::train::{TrainingController, TrainingRig};
    use adversario::{Bridge, BridgeConfig};

    let source = cluster_near(0.4, -0.4, 40);
    let (sink, mut rx) = frame_channel(1024);
    let bridge = Bridge::new(BridgeConfig { grid_size: 5, ..BridgeConfig::default() })
        .with_plot_sink(sink.clone())
        .with_loss_sink(sink.clone());
    let ensemble = Ensemble::new(EnsembleConfig::small(VariantKind::Vanilla)).unwrap();
    let controller = TrainingController::new(TrainingRig::new(ensemble, bridge), source)
        .with_iteration_limit(Some(3));

    controller.toggle().unwrap();
    controller.join().await.unwrap();
    assert_eq!(controller.iterations(), 3);
    assert_eq!(sink.dropped(), 0);

    let mut scatters = 0;
    let mut surfaces = 0;
    let mut losses = 0;
    while let Ok(frame) = rx.try_recv() {
        match frame {
            Frame::Scatter(s) => {
                scatters += 1;
                assert_eq!(s.iteration, scatters);
                assert_eq!(s.real.len(), 16);
            }
            Frame::Surface(s) => {
                surfaces += 1;
                assert_eq!(s.values.len(), 25);
            }
            Frame::Loss { value, .. } => {
                losses += 1;
                assert!(value.is_finite());
            }
            Frame::Gradient(_) | Frame::ClearLosses => {}
        }
    }
    assert_eq!(scatters, 3);
    assert_eq!(surfaces, 3);
    assert_eq!(losses, 6);
}
