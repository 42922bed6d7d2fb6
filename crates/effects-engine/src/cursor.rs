//! Cursor state calculator.
//!
//! Turns the raw mouse/click trace into the cursor the compositor draws:
//! a glided (low-pass filtered) position instead of the jittery raw
//! samples, an idle-hide visibility flag, an active click-ripple state,
//! and a motion-blur hint derived from the smoothed velocity.
//!
//! Like the camera, the full mutable state is a small serializable
//! snapshot (`CursorKinematics`), so export chunks can resume the filter
//! from a seed and reproduce a continuous pass within a small tolerance —
//! an exponential moving average forgets its history quickly enough that
//! the seam error decays within a few frames.

use serde::{Deserialize, Serialize};

use screenreel_timeline_model::{CursorEffectData, CursorStyle, EventTrace, MouseButton, NormPoint};

/// Calculator constants that are not part of the authored effect data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorTuning {
    /// Maximum elapsed time accepted per evaluation, in milliseconds.
    pub max_delta_ms: f64,

    /// Duration of a click ripple, in milliseconds.
    pub ripple_duration_ms: f64,

    /// Pointer movement below this distance (normalized) does not count
    /// as activity for idle-hide.
    pub idle_movement_eps: f64,

    /// Smoothed speed (normalized units/second) above which the
    /// motion-blur hint is raised.
    pub motion_blur_speed: f64,
}

impl Default for CursorTuning {
    fn default() -> Self {
        Self {
            max_delta_ms: 100.0,
            ripple_duration_ms: 400.0,
            idle_movement_eps: 0.002,
            motion_blur_speed: 1.5,
        }
    }
}

/// The bounded filter state handed between evaluations and across export
/// chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorKinematics {
    /// Glided position, normalized.
    pub position: NormPoint,

    /// Smoothed velocity in normalized units per second.
    pub velocity_x: f64,
    pub velocity_y: f64,

    /// Source time of the last evaluation, in milliseconds.
    pub last_source_ms: f64,
}

impl CursorKinematics {
    pub fn at_rest(position: NormPoint, source_ms: f64) -> Self {
        Self {
            position,
            velocity_x: 0.0,
            velocity_y: 0.0,
            last_source_ms: source_ms,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity_x.is_finite() && self.velocity_y.is_finite()
    }

    /// Smoothed speed in normalized units per second.
    pub fn speed(&self) -> f64 {
        (self.velocity_x * self.velocity_x + self.velocity_y * self.velocity_y).sqrt()
    }
}

/// An in-flight click ripple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickRipple {
    /// Where the click landed, normalized.
    pub position: NormPoint,
    pub button: MouseButton,
    /// Animation progress in `[0, 1]`.
    pub progress: f64,
}

/// Per-frame cursor output.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorFrame {
    pub position: NormPoint,
    pub visible: bool,
    pub ripple: Option<ClickRipple>,
    pub motion_blur: bool,
}

impl CursorFrame {
    /// The state used when no cursor can be computed.
    pub fn hidden() -> Self {
        Self {
            position: NormPoint::CENTER,
            visible: false,
            ripple: None,
            motion_blur: false,
        }
    }
}

/// Stateless calculator; all mutable state lives in the caller-owned
/// `CursorKinematics`.
#[derive(Debug, Clone, Default)]
pub struct CursorCalculator {
    tuning: CursorTuning,
}

impl CursorCalculator {
    pub fn new(tuning: CursorTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &CursorTuning {
        &self.tuning
    }

    /// Evaluate the cursor at a source time.
    ///
    /// `state` carries the glide filter between calls; it is seeded on
    /// the raw position at the first call and reseeded after a backwards
    /// step. An empty trace yields the hidden cursor.
    pub fn evaluate(
        &self,
        effect: &CursorEffectData,
        trace: &EventTrace,
        source_ms: f64,
        state: &mut Option<CursorKinematics>,
    ) -> CursorFrame {
        if effect.style == CursorStyle::Hidden {
            *state = None;
            return CursorFrame::hidden();
        }

        let Some(raw) = trace.pointer_at(source_ms) else {
            *state = None;
            return CursorFrame::hidden();
        };

        let position = if effect.gliding_enabled {
            self.glide(raw, source_ms, effect, state)
        } else {
            *state = Some(CursorKinematics::at_rest(raw, source_ms));
            raw
        };

        let visible = !effect.hide_when_idle || !self.is_idle(effect, trace, source_ms);
        let ripple = if effect.click_effects {
            self.active_ripple(trace, source_ms)
        } else {
            None
        };
        let motion_blur = effect.motion_blur
            && state
                .map(|k| k.speed() > self.tuning.motion_blur_speed)
                .unwrap_or(false);

        CursorFrame {
            position,
            visible,
            ripple,
            motion_blur,
        }
    }

    /// Advance the exponential moving average toward the raw position.
    ///
    /// The filter constant is derived from the effect's glide speed and
    /// smoothness so that a given configuration converges at the same
    /// rate regardless of evaluation cadence:
    /// `alpha = 1 - exp(-speed * (1 - smoothness) * dt)`.
    fn glide(
        &self,
        raw: NormPoint,
        source_ms: f64,
        effect: &CursorEffectData,
        state: &mut Option<CursorKinematics>,
    ) -> NormPoint {
        let current = match state {
            Some(k) if k.is_finite() && source_ms >= k.last_source_ms => k,
            _ => {
                *state = Some(CursorKinematics::at_rest(raw, source_ms));
                return raw;
            }
        };

        let delta_ms = (source_ms - current.last_source_ms).min(self.tuning.max_delta_ms);
        let dt_secs = delta_ms / 1000.0;
        if dt_secs <= 0.0 {
            return current.position;
        }

        let rate = effect.glide_speed * (1.0 - effect.glide_smoothness.clamp(0.0, 0.999));
        let alpha = 1.0 - (-rate * dt_secs).exp();

        let prev = current.position;
        current.position = NormPoint::new(
            prev.x + (raw.x - prev.x) * alpha,
            prev.y + (raw.y - prev.y) * alpha,
        );
        current.velocity_x = (current.position.x - prev.x) / dt_secs;
        current.velocity_y = (current.position.y - prev.y) / dt_secs;
        current.last_source_ms = source_ms;

        current.position
    }

    /// Whether the pointer has been inactive longer than the idle timeout.
    fn is_idle(&self, effect: &CursorEffectData, trace: &EventTrace, source_ms: f64) -> bool {
        match trace.last_activity_before(source_ms, self.tuning.idle_movement_eps) {
            Some(last) => source_ms - last > effect.idle_timeout_ms,
            None => true,
        }
    }

    /// Most recent click whose ripple window still covers `source_ms`.
    fn active_ripple(&self, trace: &EventTrace, source_ms: f64) -> Option<ClickRipple> {
        let window_start = source_ms - self.tuning.ripple_duration_ms;
        let click = trace.clicks_between(window_start, source_ms).last()?;
        let progress = (source_ms - click.time_ms) / self.tuning.ripple_duration_ms;
        Some(ClickRipple {
            position: trace.normalize(click.x, click.y, click.capture_size),
            button: click.button,
            progress: progress.clamp(0.0, 1.0),
        })
    }
}
