//! Iteration phase timing.
//!
//! A process-wide [`TRACER`] records how long each phase of a training
//! iteration takes. It is off by default; the CLI turns it on with `--trace`
//! and prints [`Tracer::report`] when the run ends.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Phases of one training iteration plus publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceStep {
    /// Drawing real points and latent noise
    Sample,
    /// Inference pass of every generator
    Generate,
    /// Router arg-max over the real batch
    Route,
    /// Discriminator updates
    Discriminate,
    /// Generator and classifier updates
    Adversarial,
    /// Loss aggregation
    Metrics,
    /// Handing the record to the sinks
    Publish,
}

impl TraceStep {
    /// Whether the step performs optimizer updates.
    pub fn is_update(self) -> bool {
        matches!(self, Self::Discriminate | Self::Adversarial)
    }
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single timing measurement.
#[derive(Debug, Clone)]
pub struct TraceMeasurement {
    pub step: TraceStep,
    pub duration: Duration,
    pub label: String,
}

/// Thread-safe collector of phase timings.
pub struct Tracer {
    measurements: Mutex<Vec<TraceMeasurement>>,
    enabled: Mutex<bool>,
}

impl Tracer {
    pub fn new() -> Self {
        Self { measurements: Mutex::new(Vec::new()), enabled: Mutex::new(false) }
    }

    pub fn enable(&self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn disable(&self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a measurement directly.
    pub fn record(&self, step: TraceStep, duration: Duration, label: impl Into<String>) {
        if !self.is_enabled() {
            return;
        }
        self.measurements.lock().unwrap_or_else(PoisonError::into_inner).push(TraceMeasurement {
            step,
            duration,
            label: label.into(),
        });
    }

    /// Run a closure and record how long it took.
    ///
    /// Spans are timed on the caller's stack, so several ensembles can be
    /// traced at once without clobbering each other.
    #[inline]
    pub fn span<F, R>(&self, step: TraceStep, label: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.is_enabled() {
            return f();
        }
        let start = Instant::now();
        let result = f();
        self.record(step, start.elapsed(), label);
        result
    }

    pub fn clear(&self) {
        self.measurements.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of recorded measurements.
    pub fn len(&self) -> usize {
        self.measurements.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summarise recorded timings per step, slowest first.
    pub fn report(&self) -> String {
        let measurements = self.measurements.lock().unwrap_or_else(PoisonError::into_inner);
        if measurements.is_empty() {
            return "No measurements recorded. Enable tracing with TRACER.enable()".to_string();
        }

        let mut totals: HashMap<TraceStep, (Duration, usize)> = HashMap::new();
        let mut total_time = Duration::ZERO;
        for m in measurements.iter() {
            let entry = totals.entry(m.step).or_default();
            entry.0 += m.duration;
            entry.1 += 1;
            total_time += m.duration;
        }

        let rule = "─".repeat(62);
        let mut output = String::from("\nADVERSARIO ITERATION TRACE\n");
        output.push_str(&format!("Total measured time: {total_time:.2?}\n{rule}\n"));
        output.push_str(&format!(
            "{:<13} | {:<8} | {:<14} | {:<12} | {:<8}\n",
            "Step", "Count", "Total", "Mean", "% Time"
        ));
        output.push_str(&format!("{rule}\n"));

        let mut steps: Vec<_> = totals.iter().collect();
        steps.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));

        for (step, &(duration, count)) in steps {
            let share = if total_time.as_nanos() > 0 {
                duration.as_secs_f64() / total_time.as_secs_f64() * 100.0
            } else {
                0.0
            };
            let mean = duration / count.max(1) as u32;
            output.push_str(&format!(
                "{:<13} | {:<8} | {:<14.2?} | {:<12.2?} | {:>7.2}%\n",
                step.to_string(),
                count,
                duration,
                mean,
                share
            ));
        }
        output.push_str(&format!("{rule}\n"));

        let update_time: Duration =
            totals.iter().filter(|(s, _)| s.is_update()).map(|(_, (d, _))| *d).sum();
        if total_time.as_nanos() > 0 {
            let update_pct = update_time.as_secs_f64() / total_time.as_secs_f64() * 100.0;
            output.push_str(&format!("Optimizer updates: {update_time:.2?} ({update_pct:.1}%)\n"));
            if update_pct < 50.0 {
                output.push_str("Bookkeeping dominates; consider raising surface_every.\n");
            }
        }

        output
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Global tracer instance.
pub static TRACER: LazyLock<Tracer> = LazyLock::new(Tracer::new);
