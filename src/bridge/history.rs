//! Bounded loss history kept alongside the external sinks.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use super::LossSink;
use crate::Result;

/// Default number of samples kept per series.
pub const DEFAULT_HISTORY: usize = 150;

/// Ring buffer per series, oldest samples dropped first.
#[derive(Debug, Clone, Serialize)]
pub struct LossHistory {
    capacity: usize,
    series: BTreeMap<String, VecDeque<(u64, f32)>>,
}

impl Default for LossHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl LossHistory {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), series: BTreeMap::new() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, series: &str, iteration: u64, value: f32) {
        let buf = self.series.entry(series.to_string()).or_default();
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back((iteration, value));
    }

    /// Series names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn values(&self, series: &str) -> Vec<f32> {
        self.series.get(series).map(|b| b.iter().map(|&(_, v)| v).collect()).unwrap_or_default()
    }

    pub fn len(&self, series: &str) -> usize {
        self.series.get(series).map_or(0, VecDeque::len)
    }

    pub fn latest(&self, series: &str) -> Option<(u64, f32)> {
        self.series.get(series).and_then(|b| b.back().copied())
    }

    /// Mean of the finite values kept for `series`, NaN if there are none.
    pub fn mean(&self, series: &str) -> f32 {
        let values: Vec<f32> = self.values(series).into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return f32::NAN;
        }
        values.iter().sum::<f32>() / values.len() as f32
    }

    pub fn sparkline(&self, series: &str) -> String {
        sparkline(&self.values(series))
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "capacity": self.capacity,
            "series": self.series.iter().map(|(name, buf)| {
                (name.clone(), buf.iter().map(|&(_, v)| v).collect::<Vec<_>>())
            }).collect::<BTreeMap<_, _>>(),
        })
    }
}

impl LossSink for LossHistory {
    fn push_loss_sample(&mut self, series: &str, iteration: u64, value: f32) -> Result<()> {
        self.record(series, iteration, value);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        LossHistory::clear(self);
        Ok(())
    }
}

/// Render values as a row of block characters, low to high.
pub fn sparkline(values: &[f32]) -> String {
    const CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = if (max - min).abs() < 1e-10 { 1.0 } else { max - min };

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return ' ';
            }
            let norm = ((v - min) / range).clamp(0.0, 1.0);
            CHARS[((norm * 7.0).round() as usize).min(7)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_capacity_bound() {
        let mut h = LossHistory::new(3);
        for i in 0..10 {
            h.record("generator loss", i, i as f32);
        }
        assert_eq!(h.len("generator loss"), 3);
        assert_eq!(h.values("generator loss"), vec![7.0, 8.0, 9.0]);
        assert_eq!(h.latest("generator loss"), Some((9, 9.0)));
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(LossHistory::default().capacity(), 150);
    }

    #[test]
    fn test_mean_ignores_nan() {
        let mut h = LossHistory::new(10);
        h.record("d", 1, 1.0);
        h.record("d", 2, f32::NAN);
        h.record("d", 3, 3.0);
        assert_relative_eq!(h.mean("d"), 2.0);
        assert!(h.mean("missing").is_nan());
    }

    #[test]
    fn test_sink_clear() {
        let mut h = LossHistory::new(10);
        h.push_loss_sample("x", 1, 0.5).unwrap();
        LossSink::clear(&mut h).unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn test_sparkline() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[0.0, 1.0]), "▁█");
        assert_eq!(sparkline(&[2.0, 2.0, 2.0]).chars().count(), 3);
        assert_eq!(sparkline(&[0.0, f32::NAN, 1.0]), "▁ █");
    }

    #[test]
    fn test_json() {
        let mut h = LossHistory::new(5);
        h.record("generator loss", 1, 0.5);
        let json = h.to_json();
        assert_eq!(json["capacity"], 5);
        assert_eq!(json["series"]["generator loss"][0], 0.5);
    }
}
