//! Publish-rate counter.

use std::time::{Duration, Instant};

/// Counts frames and reports a rate once per interval.
#[derive(Debug, Clone)]
pub struct FrameRate {
    interval: Duration,
    window_start: Instant,
    frames: u32,
    last: Option<f32>,
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl FrameRate {
    pub fn new(interval: Duration) -> Self {
        Self { interval, window_start: Instant::now(), frames: 0, last: None }
    }

    /// Count a frame; returns the rate when an interval has elapsed.
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let rate = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        self.last = Some(rate);
        Some(rate)
    }

    /// Rate reported at the end of the last full interval.
    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reports_after_interval() {
        let start = Instant::now();
        let mut rate = FrameRate { window_start: start, ..FrameRate::new(Duration::from_secs(2)) };
        for i in 1..10 {
            assert_eq!(rate.tick_at(start + Duration::from_millis(i * 100)), None);
        }
        let fps = rate.tick_at(start + Duration::from_secs(2)).unwrap();
        assert_relative_eq!(fps, 5.0);
        assert_eq!(rate.last(), Some(fps));
    }

    #[test]
    fn test_window_restarts() {
        let start = Instant::now();
        let mut rate = FrameRate { window_start: start, ..FrameRate::new(Duration::from_secs(1)) };
        rate.tick_at(start + Duration::from_secs(1));
        assert_eq!(rate.tick_at(start + Duration::from_millis(1500)), None);
    }
}
