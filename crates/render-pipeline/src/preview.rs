//! Interactive preview playback.
//!
//! The preview loop is single-threaded and cooperative: the UI calls
//! `tick` from its frame callback with a monotonic elapsed clock, and the
//! session advances the playhead by the real elapsed delta — clamped by
//! the `PreviewTicker` so a stalled tab or a long GC pause never feeds
//! the spring a destabilizing step. Seeks drop the physics state rather
//! than integrating across the discontinuity.

use screenreel_common::PreviewTicker;
use screenreel_effects_engine::{EvalState, FrameEvaluator, RenderFrameParams};

/// A stateful preview playback session over one evaluator.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    evaluator: FrameEvaluator,
    ticker: PreviewTicker,
    state: EvalState,
    position_ms: f64,
    playing: bool,
}

impl PreviewSession {
    pub fn new(evaluator: FrameEvaluator, max_tick_delta_ms: f64) -> Self {
        Self {
            evaluator,
            ticker: PreviewTicker::new(max_tick_delta_ms),
            state: EvalState::default(),
            position_ms: 0.0,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current playhead position in timeline milliseconds.
    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    /// Duration of the laid-out timeline in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        screenreel_common::frame_to_ms(self.evaluator.total_frames(), self.evaluator.fps())
    }

    /// Move the playhead. Any seek discards the physics state; the
    /// calculators reseed on the next evaluation instead of springing
    /// across the jump.
    pub fn seek(&mut self, timeline_ms: f64) {
        self.position_ms = timeline_ms.clamp(0.0, self.duration_ms());
        self.state = EvalState::default();
        self.ticker.reset();
    }

    /// Advance by the real elapsed time and evaluate the current frame.
    ///
    /// `elapsed_ms` is a monotonic clock since session start. While
    /// paused the playhead holds but evaluation still runs, so scrubbing
    /// stays live.
    pub fn tick(&mut self, elapsed_ms: f64) -> RenderFrameParams {
        let delta = self.ticker.tick(elapsed_ms);
        if self.playing {
            self.position_ms = (self.position_ms + delta).min(self.duration_ms());
            if self.position_ms >= self.duration_ms() {
                self.playing = false;
            }
        }
        self.evaluator.evaluate_at(self.position_ms, &mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenreel_timeline_model::{
        Clip, CursorEffectData, Recording, RecordingStore, Track,
    };

    fn session() -> PreviewSession {
        let track = Track::new("t1", vec![Clip::new("a", "r1", 0.0, 2000.0)]);
        let recordings: RecordingStore =
            [Recording::new("r1", 1000, 1000, 2000.0)].into_iter().collect();
        let evaluator =
            FrameEvaluator::new(track, Vec::new(), CursorEffectData::default(), recordings, 30)
                .unwrap();
        PreviewSession::new(evaluator, 100.0)
    }

    #[test]
    fn test_playback_advances_by_elapsed_delta() {
        let mut session = session();
        session.play();
        session.tick(0.0);
        session.tick(16.7);
        session.tick(33.4);
        assert!((session.position_ms() - 33.4).abs() < 1e-9);
    }

    #[test]
    fn test_stall_advances_at_most_the_clamp() {
        let mut session = session();
        session.play();
        session.tick(0.0);
        session.tick(1500.0);
        assert_eq!(session.position_ms(), 100.0);
    }

    #[test]
    fn test_paused_session_holds_position() {
        let mut session = session();
        session.tick(0.0);
        session.tick(500.0);
        assert_eq!(session.position_ms(), 0.0);
    }

    #[test]
    fn test_seek_clamps_and_resets_tick_delta() {
        let mut session = session();
        session.play();
        session.tick(0.0);
        session.seek(50000.0);
        assert_eq!(session.position_ms(), session.duration_ms());

        session.seek(500.0);
        // First tick after a seek contributes no delta.
        session.tick(2000.0);
        assert_eq!(session.position_ms(), 500.0);
    }

    #[test]
    fn test_playback_stops_at_the_end() {
        let mut session = session();
        session.seek(session.duration_ms() - 10.0);
        session.play();
        session.tick(0.0);
        session.tick(50.0);
        assert_eq!(session.position_ms(), session.duration_ms());
        assert!(!session.is_playing());
    }
}
