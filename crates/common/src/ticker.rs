//! Frame timing utilities for playback and evaluation loops.
//!
//! Preview playback advances physics with real elapsed time; a stalled
//! tick (backgrounded window, GC pause) must not feed a huge delta into
//! the spring integrator. `PreviewTicker` clamps deltas at the source.

/// Duration of one output frame in milliseconds.
pub fn frame_duration_ms(fps: u32) -> f64 {
    1000.0 / fps.max(1) as f64
}

/// Convert a frame index to its timeline millisecond.
pub fn frame_to_ms(frame: u64, fps: u32) -> f64 {
    frame as f64 * frame_duration_ms(fps)
}

/// Convert a timeline millisecond to the nearest frame boundary.
pub fn ms_to_frame(ms: f64, fps: u32) -> u64 {
    (ms / frame_duration_ms(fps)).round().max(0.0) as u64
}

/// Tick source for the cooperative preview loop.
///
/// Each call to `tick` reports the elapsed time since the previous tick,
/// clamped to `max_delta_ms` so a long stall never destabilizes physics.
#[derive(Debug, Clone)]
pub struct PreviewTicker {
    max_delta_ms: f64,
    last_elapsed_ms: Option<f64>,
}

impl PreviewTicker {
    /// Create a ticker with the given delta clamp.
    pub fn new(max_delta_ms: f64) -> Self {
        Self {
            max_delta_ms: max_delta_ms.max(0.0),
            last_elapsed_ms: None,
        }
    }

    /// Register a tick at `elapsed_ms` (monotonic, ms since session start)
    /// and return the clamped delta to integrate. The first tick yields 0.
    pub fn tick(&mut self, elapsed_ms: f64) -> f64 {
        let delta = match self.last_elapsed_ms {
            Some(last) => (elapsed_ms - last).max(0.0).min(self.max_delta_ms),
            None => 0.0,
        };
        self.last_elapsed_ms = Some(elapsed_ms);
        delta
    }

    /// Forget the previous tick (e.g., after a seek), so the next delta is 0.
    pub fn reset(&mut self) {
        self.last_elapsed_ms = None;
    }

    /// The configured delta clamp.
    pub fn max_delta_ms(&self) -> f64 {
        self.max_delta_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_conversions() {
        assert!((frame_duration_ms(30) - 33.333333333333336).abs() < 1e-9);
        assert!((frame_to_ms(30, 30) - 1000.0).abs() < 1e-9);
        assert_eq!(ms_to_frame(1000.0, 30), 30);
        assert_eq!(ms_to_frame(frame_to_ms(127, 30), 30), 127);
    }

    #[test]
    fn test_first_tick_is_zero() {
        let mut ticker = PreviewTicker::new(100.0);
        assert_eq!(ticker.tick(5000.0), 0.0);
    }

    #[test]
    fn test_delta_is_clamped_after_stall() {
        let mut ticker = PreviewTicker::new(100.0);
        ticker.tick(0.0);
        assert!((ticker.tick(16.7) - 16.7).abs() < 1e-9);
        // 5 second stall clamps to the maximum
        assert_eq!(ticker.tick(5016.7), 100.0);
    }

    #[test]
    fn test_backwards_elapsed_yields_zero() {
        let mut ticker = PreviewTicker::new(100.0);
        ticker.tick(100.0);
        assert_eq!(ticker.tick(50.0), 0.0);
    }

    #[test]
    fn test_reset_forgets_last_tick() {
        let mut ticker = PreviewTicker::new(100.0);
        ticker.tick(0.0);
        ticker.tick(16.0);
        ticker.reset();
        assert_eq!(ticker.tick(2000.0), 0.0);
    }
}
