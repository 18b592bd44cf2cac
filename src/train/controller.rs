//! Toggle-style control of a training loop.
//!
//! A [`TrainingController`] owns one background task per run. `toggle`
//! starts it, asks it to stop, or revokes a pending stop. The task checks
//! its state only at the top of each iteration, so an iteration that has
//! started always finishes its optimizer steps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use super::StepRecord;
use crate::bridge::Bridge;
use crate::data::SampleSource;
use crate::generative::Ensemble;
use crate::trace::{TraceStep, TRACER};
use crate::{Error, Result};

/// State of a controller's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Running,
    /// Stop requested; the loop exits at the next iteration boundary
    Stopping,
}

/// What a call to [`TrainingController::toggle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    StopRequested,
    /// A pending stop was withdrawn before the loop reached it
    Resumed,
}

/// An ensemble and the bridge that publishes its output, locked together for
/// one iteration at a time.
#[derive(Debug)]
pub struct TrainingRig {
    pub ensemble: Ensemble,
    pub bridge: Bridge,
}

impl TrainingRig {
    pub fn new(ensemble: Ensemble, bridge: Bridge) -> Self {
        Self { ensemble, bridge }
    }

    /// Train one iteration and publish it.
    pub async fn step(&mut self, source: &SampleSource) -> Result<StepRecord> {
        let record = self.ensemble.train_step(source).await?;
        let Self { ensemble, bridge } = self;
        TRACER.span(TraceStep::Publish, ensemble.name(), || bridge.publish(&record, ensemble));
        Ok(record)
    }

    /// Redraw weights and forget the loss history.
    pub fn reset(&mut self) {
        self.ensemble.reinitialize();
        self.bridge.clear_losses();
    }
}

#[derive(Debug)]
struct LoopState {
    phase: Mutex<LoopPhase>,
    iterations: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl LoopState {
    fn phase(&self) -> LoopPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: LoopPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Called at the top of every iteration: false means exit now.
    fn proceed(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            LoopPhase::Running => true,
            LoopPhase::Stopping => {
                *phase = LoopPhase::Idle;
                false
            }
            LoopPhase::Idle => false,
        }
    }

    fn fail(&self, message: String) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
        self.set_phase(LoopPhase::Idle);
    }
}

/// Starts, stops and resumes training of one ensemble.
#[derive(Debug)]
pub struct TrainingController {
    name: String,
    state: Arc<LoopState>,
    rig: Arc<tokio::sync::Mutex<TrainingRig>>,
    source: SampleSource,
    handle: Mutex<Option<JoinHandle<()>>>,
    iteration_limit: Option<u64>,
}

impl TrainingController {
    pub fn new(rig: TrainingRig, source: SampleSource) -> Self {
        let name = rig.ensemble.name().to_string();
        let iteration_limit = rig.ensemble.config().iteration_limit;
        let state = LoopState {
            phase: Mutex::new(LoopPhase::Idle),
            iterations: AtomicU64::new(rig.ensemble.iteration()),
            last_error: Mutex::new(None),
        };
        Self {
            name,
            state: Arc::new(state),
            rig: Arc::new(tokio::sync::Mutex::new(rig)),
            source,
            handle: Mutex::new(None),
            iteration_limit,
        }
    }

    /// Stop each run after `limit` iterations.
    #[must_use]
    pub fn with_iteration_limit(mut self, limit: Option<u64>) -> Self {
        self.iteration_limit = limit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle on the ensemble and bridge. Locking it waits for the
    /// current iteration to finish.
    pub fn rig(&self) -> &Arc<tokio::sync::Mutex<TrainingRig>> {
        &self.rig
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.phase()
    }

    /// True while a run is active, including one asked to stop.
    pub fn is_training(&self) -> bool {
        self.phase() != LoopPhase::Idle
    }

    /// Ensemble iteration counter as of the last completed iteration.
    pub fn iterations(&self) -> u64 {
        self.state.iterations.load(Ordering::Acquire)
    }

    /// Why the last run ended early, if it did.
    pub fn last_error(&self) -> Option<String> {
        self.state.last_error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Flip between training and not training.
    ///
    /// Must be called from within a Tokio runtime. Starting with an empty
    /// sample source is rejected.
    pub fn toggle(&self) -> Result<ToggleOutcome> {
        let mut phase = self.state.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            LoopPhase::Running => {
                *phase = LoopPhase::Stopping;
                tracing::info!(ensemble = %self.name, "stop requested");
                Ok(ToggleOutcome::StopRequested)
            }
            LoopPhase::Stopping => {
                *phase = LoopPhase::Running;
                tracing::info!(ensemble = %self.name, "stop withdrawn");
                Ok(ToggleOutcome::Resumed)
            }
            LoopPhase::Idle => {
                if self.source.is_empty() {
                    tracing::warn!(ensemble = %self.name, "refusing to train on an empty source");
                    return Err(Error::EmptySource);
                }
                let runtime = tokio::runtime::Handle::try_current()
                    .map_err(|e| Error::TaskFailed(format!("no async runtime: {e}")))?;
                *phase = LoopPhase::Running;
                drop(phase);
                *self.state.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;

                let task = run_loop(
                    self.name.clone(),
                    Arc::clone(&self.state),
                    Arc::clone(&self.rig),
                    self.source.clone(),
                    self.iteration_limit,
                );
                let handle = runtime.spawn(task);
                *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                tracing::info!(ensemble = %self.name, "training started");
                Ok(ToggleOutcome::Started)
            }
        }
    }

    /// Ask a running loop to stop at its next iteration boundary.
    /// Returns false if there was nothing to stop.
    pub fn request_stop(&self) -> bool {
        let mut phase = self.state.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            LoopPhase::Running => {
                *phase = LoopPhase::Stopping;
                true
            }
            LoopPhase::Stopping => true,
            LoopPhase::Idle => false,
        }
    }

    /// Wait for the current run's task to exit, if there is one.
    pub async fn join(&self) -> Result<()> {
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        match handle {
            Some(handle) => match handle.await {
                Ok(()) => Ok(()),
                // The run guard has already recorded the failure and gone Idle.
                Err(e) if e.is_panic() => Ok(()),
                Err(e) => {
                    self.state.fail(e.to_string());
                    Err(Error::TaskFailed(e.to_string()))
                }
            },
            None => Ok(()),
        }
    }

    /// Request a stop and wait until the loop has exited.
    pub async fn stop(&self) -> Result<()> {
        self.request_stop();
        self.join().await
    }
}

async fn run_loop(
    name: String,
    state: Arc<LoopState>,
    rig: Arc<tokio::sync::Mutex<TrainingRig>>,
    source: SampleSource,
    limit: Option<u64>,
) {
    let guard = RunGuard { name: &name, state: &state, finished: false };
    let mut completed = 0u64;
    while state.proceed() {
        let result = {
            let mut rig = rig.lock().await;
            rig.step(&source).await
        };
        match result {
            Ok(record) => {
                state.iterations.store(record.iteration, Ordering::Release);
                completed += 1;
                if limit.is_some_and(|limit| completed >= limit) {
                    tracing::info!(ensemble = %name, iterations = completed, "iteration limit reached");
                    state.set_phase(LoopPhase::Idle);
                    break;
                }
            }
            Err(e) => {
                tracing::error!(ensemble = %name, error = %e, "training loop stopped");
                state.fail(e.to_string());
                break;
            }
        }
        tokio::task::yield_now().await;
    }
    guard.finish();
}

/// Returns the loop to Idle however the task ends. A task that unwinds or is
/// dropped mid-iteration records a failure instead of staying Running.
struct RunGuard<'a> {
    name: &'a str,
    state: &'a LoopState,
    finished: bool,
}

impl RunGuard<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let message =
                if std::thread::panicking() { "training iteration panicked" } else { "training task cancelled" };
            tracing::error!(ensemble = %self.name, "{message}");
            self.state.fail(message.to_string());
        }
        tracing::info!(
            ensemble = %self.name,
            iterations = self.state.iterations.load(Ordering::Acquire),
            "training loop exited"
        );
    }
}
