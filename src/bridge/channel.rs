//! Bounded channel sink for a UI running on another task.
//!
//! The training loop must never wait on the consumer: frames are offered
//! with `try_send` and dropped when the channel is full.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{GradientFrame, LossSink, PlotSink, ScatterFrame, SurfaceFrame};
use crate::{Error, Result};

/// Anything the bridge can emit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Surface(SurfaceFrame),
    Gradient(GradientFrame),
    Scatter(ScatterFrame),
    Loss { series: String, iteration: u64, value: f32 },
    ClearLosses,
}

/// Producer half. Cloning shares the channel and the drop counter.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Frame>,
    dropped: Arc<AtomicU64>,
}

/// A sink and the receiver a consumer drains.
pub fn frame_channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelSink { tx, dropped: Arc::new(AtomicU64::new(0)) }, rx)
}

impl ChannelSink {
    fn offer(&self, frame: Frame) -> Result<()> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(Error::Sink("frame receiver dropped".into())),
        }
    }

    /// Frames discarded because the consumer lagged.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl PlotSink for ChannelSink {
    fn update_decision_surface(&mut self, frame: &SurfaceFrame) -> Result<()> {
        self.offer(Frame::Surface(frame.clone()))
    }

    fn update_gradient_field(&mut self, frame: &GradientFrame) -> Result<()> {
        self.offer(Frame::Gradient(frame.clone()))
    }

    fn update_scatter(&mut self, frame: &ScatterFrame) -> Result<()> {
        self.offer(Frame::Scatter(frame.clone()))
    }
}

impl LossSink for ChannelSink {
    fn push_loss_sample(&mut self, series: &str, iteration: u64, value: f32) -> Result<()> {
        self.offer(Frame::Loss { series: series.to_string(), iteration, value })
    }

    fn clear(&mut self) -> Result<()> {
        self.offer(Frame::ClearLosses)
    }
}
