//! Train command implementation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cli::logging::log;
use crate::cli::{LogLevel, TrainArgs};
use crate::config::SessionConfig;
use crate::data::{Brush, Canvas, Point};
use crate::session::Session;
use crate::trace::TRACER;

/// Iterations run when neither the file nor the flags set a limit.
const DEFAULT_ITERATIONS: u64 = 500;

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    let mut config = super::session_config(args.config.as_deref())?;
    let name = apply_overrides(&mut config, &args)?;

    log(level, LogLevel::Normal, &format!("Adversario: training '{name}'"));
    if args.trace {
        TRACER.clear();
        TRACER.enable();
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Runtime error: {e}"))?;
    let summary = runtime.block_on(train(config, &args))?;

    log(level, LogLevel::Normal, &summary);
    if args.trace {
        TRACER.disable();
        log(level, LogLevel::Normal, &TRACER.report());
    }
    log(level, LogLevel::Normal, "Training complete!");
    Ok(())
}

/// Apply flags to `config` and return the ensemble to train.
pub fn apply_overrides(config: &mut SessionConfig, args: &TrainArgs) -> Result<String, String> {
    if let Some(name) = &args.ensemble {
        config.active = Some(name.clone());
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let name = config.active_name().ok_or("No ensembles configured")?.to_string();
    let ensemble = config
        .ensembles
        .iter_mut()
        .find(|e| e.name == name)
        .ok_or_else(|| format!("Unknown ensemble: {name}"))?;
    if let Some(seed) = args.seed {
        ensemble.seed = Some(seed);
    }
    ensemble.iteration_limit = args.iterations.or(ensemble.iteration_limit).or(Some(DEFAULT_ITERATIONS));
    Ok(name)
}

/// Cluster centres evenly spaced on a circle around the canvas centre.
pub fn paint_clusters<R: Rng + ?Sized>(clusters: usize, points: usize, rng: &mut R) -> Vec<Point> {
    let canvas = Canvas::default();
    let brush = Brush { points_per_stroke: points, ..Brush::default() };
    let radius = canvas.width.min(canvas.height) * 0.25;
    (0..clusters)
        .flat_map(|c| {
            let angle = std::f32::consts::TAU * c as f32 / clusters.max(1) as f32;
            let centre = Point::new(
                canvas.width * 0.5 + radius * angle.cos(),
                canvas.height * 0.5 + radius * angle.sin(),
            );
            brush.stroke_on(&canvas, centre, rng)
        })
        .collect()
}

async fn train(config: SessionConfig, args: &TrainArgs) -> Result<String, String> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut session = Session::new(config).map_err(|e| format!("Config error [{}]: {e}", e.code()))?;
    session.extend_points(paint_clusters(args.clusters, args.points, &mut rng));

    session.toggle_training().await.map_err(|e| e.to_string())?;
    let controller = session.active_controller().map_err(|e| e.to_string())?;
    controller.join().await.map_err(|e| e.to_string())?;
    if let Some(error) = controller.last_error() {
        return Err(format!("Training error: {error}"));
    }

    let rig = controller.rig().lock().await;
    let history = rig.bridge.history();
    let mut lines = vec![format!("Iterations: {}", rig.ensemble.iteration())];
    for series in history.names() {
        let latest = history.latest(series).map_or(f32::NAN, |(_, v)| v);
        lines.push(format!(
            "  {series:<22} {} mean {:.4} last {:.4}",
            history.sparkline(series),
            history.mean(series),
            latest
        ));
    }
    Ok(lines.join("\n"))
}
