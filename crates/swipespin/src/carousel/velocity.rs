use std::collections::VecDeque;
use std::time::Duration;

pub const FRAME_MS: f64 = 16.0;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f64,
    t: f64,
}

#[derive(Debug, Clone)]
pub struct VelocityTracker {
    samples: VecDeque<Sample>,
    window_ms: f64,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl VelocityTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            samples: VecDeque::with_capacity(16),
            window_ms: window.as_secs_f64() * 1000.0,
        }
    }

    pub fn push(&mut self, x: f64, timestamp_ms: f64) {
        self.samples.push_back(Sample { x, t: timestamp_ms });

        let cutoff = timestamp_ms - self.window_ms;
        while self.samples.len() > 1 && self.samples.front().is_some_and(|s| s.t < cutoff) {
            self.samples.pop_front();
        }
    }

    /// Pixels per frame at 60fps. Zero when there is not enough history.
    pub fn estimate(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.t - first.t;
        if self.samples.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (last.x - first.x) / elapsed * FRAME_MS
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_samples() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 0.0);
        tracker.push(50.0, 50.0);
        assert_eq!(tracker.estimate(), 16.0);
    }

    #[test]
    fn test_single_sample_is_zero() {
        let mut tracker = VelocityTracker::default();
        assert_eq!(tracker.estimate(), 0.0);
        tracker.push(120.0, 10.0);
        assert_eq!(tracker.estimate(), 0.0);
    }

    #[test]
    fn test_zero_elapsed_is_zero() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 40.0);
        tracker.push(30.0, 40.0);
        assert_eq!(tracker.estimate(), 0.0);
    }

    #[test]
    fn test_old_samples_fall_out_of_window() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 0.0);
        tracker.push(1000.0, 10.0);
        // A long pause, then a slow movement: only the recent part counts.
        tracker.push(1000.0, 300.0);
        tracker.push(1010.0, 350.0);
        assert_eq!(tracker.len(), 2);
        assert!((tracker.estimate() - 10.0 / 50.0 * 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_newest_sample_is_kept() {
        let mut tracker = VelocityTracker::new(Duration::from_millis(10));
        tracker.push(0.0, 0.0);
        tracker.push(5.0, 500.0);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.estimate(), 0.0);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut tracker = VelocityTracker::default();
        tracker.push(0.0, 0.0);
        tracker.push(50.0, 50.0);
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.estimate(), 0.0);
    }

    #[test]
    fn test_leftward_motion_is_negative() {
        let mut tracker = VelocityTracker::default();
        tracker.push(200.0, 0.0);
        tracker.push(150.0, 25.0);
        tracker.push(100.0, 50.0);
        assert_eq!(tracker.estimate(), -32.0);
    }
}
