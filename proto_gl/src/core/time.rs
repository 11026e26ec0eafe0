//! Implements timing for the application. Computes delta times between
//! frames and the pause needed to cap the frame rate

use std::time::{Duration, Instant};

pub struct Time {
    last_time: Instant,
    delta_time: Duration,
}

impl Time {
    pub fn new(current_instant: Instant) -> Self {
        Time {
            last_time: current_instant,
            delta_time: Duration::ZERO,
        }
    }

    #[inline(always)]
    pub fn delta(&self) -> Duration {
        self.delta_time
    }

    #[inline(always)]
    pub fn delta_seconds(&self) -> f32 {
        self.delta_time.as_secs_f32()
    }

    #[inline(always)]
    pub fn delta_milliseconds(&self) -> f32 {
        self.delta_seconds() * 1000.0
    }

    #[inline(always)]
    pub fn last_instant(&self) -> Instant {
        self.last_time
    }

    /// An instant earlier than the previous one counts as no time elapsed
    pub fn step(&mut self, instant: Instant) {
        self.delta_time = instant.saturating_duration_since(self.last_time);
        self.last_time = instant;
    }
}

/// Caps the frame rate by sleeping away what is left of each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimiter {
    min_frame_time: Option<Duration>,
}

impl FrameLimiter {
    /// `max_frame_rate` of 0 disables limiting
    pub fn new(max_frame_rate: u32) -> Self {
        let min_frame_time = (max_frame_rate > 0)
            .then(|| Duration::from_nanos(1_000_000_000 / max_frame_rate as u64));
        FrameLimiter { min_frame_time }
    }

    #[inline(always)]
    pub fn min_frame_time(&self) -> Option<Duration> {
        self.min_frame_time
    }

    /// How long to wait after a frame that took `elapsed`
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.min_frame_time
            .map(|min| min.saturating_sub(elapsed))
            .unwrap_or(Duration::ZERO)
    }

    /// Sleep until the frame started at `frame_start` has lasted long enough
    pub fn wait(&self, frame_start: Instant) {
        let remaining = self.remaining(frame_start.elapsed());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_measures_delta() {
        let start = Instant::now();
        let mut time = Time::new(start);
        time.step(start + Duration::from_millis(16));

        assert_eq!(time.delta(), Duration::from_millis(16));
        assert!((time.delta_milliseconds() - 16.0).abs() < 1e-3);

        // Going back in time does not underflow
        time.step(start);
        assert_eq!(time.delta(), Duration::ZERO);
    }

    #[test]
    fn test_frame_limiter() {
        let limiter = FrameLimiter::new(50);
        assert_eq!(limiter.min_frame_time(), Some(Duration::from_millis(20)));
        assert_eq!(
            limiter.remaining(Duration::from_millis(15)),
            Duration::from_millis(5)
        );
        assert_eq!(limiter.remaining(Duration::from_millis(30)), Duration::ZERO);

        let unlimited = FrameLimiter::new(0);
        assert_eq!(unlimited.min_frame_time(), None);
        assert_eq!(unlimited.remaining(Duration::ZERO), Duration::ZERO);
    }
}
