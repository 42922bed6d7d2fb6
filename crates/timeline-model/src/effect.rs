//! Effect definitions authored in the editor.
//!
//! Zoom effects drive the camera calculator; cursor effect data drives the
//! cursor calculator. Both are plain data — the engine never mutates them.

use serde::{Deserialize, Serialize};

use crate::geometry::NormPoint;

/// How the camera chooses its target while a zoom effect is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FollowStrategy {
    /// Camera aims at the effect's stored target point.
    FixedPoint,
    /// Camera follows the recorded mouse position at the current source time.
    MouseFollow,
}

/// A zoom/pan effect over a timeline range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomEffect {
    pub id: String,

    /// Timeline range the effect covers, in milliseconds.
    pub start_time_ms: f64,
    pub end_time_ms: f64,

    /// Zoom target in normalized capture coordinates.
    pub target: NormPoint,

    /// Zoom scale at full strength (1.0 = no zoom).
    pub scale: f64,

    /// Ramp durations inside the effect range.
    pub intro_ms: f64,
    pub outro_ms: f64,

    #[serde(flatten)]
    pub follow: FollowStrategy,
}

impl ZoomEffect {
    /// Validate range and ramp invariants.
    pub fn validate(&self) -> Result<(), EffectError> {
        if !(self.end_time_ms > self.start_time_ms) {
            return Err(EffectError::EmptyRange {
                effect_id: self.id.clone(),
            });
        }
        if !(self.scale >= 1.0) || !self.scale.is_finite() {
            return Err(EffectError::InvalidScale {
                effect_id: self.id.clone(),
                scale: self.scale,
            });
        }
        if self.intro_ms < 0.0
            || self.outro_ms < 0.0
            || self.intro_ms + self.outro_ms > self.end_time_ms - self.start_time_ms
        {
            return Err(EffectError::RampsExceedRange {
                effect_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Duration of the effect on the timeline.
    pub fn duration_ms(&self) -> f64 {
        self.end_time_ms - self.start_time_ms
    }

    /// Whether a timeline millisecond falls inside the effect range.
    pub fn contains(&self, timeline_ms: f64) -> bool {
        timeline_ms >= self.start_time_ms && timeline_ms < self.end_time_ms
    }
}

/// Cursor rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    #[default]
    Pointer,
    Circle,
    Hidden,
}

/// Cursor rendering and behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorEffectData {
    pub style: CursorStyle,

    /// Cursor size multiplier relative to the default asset size.
    pub size: f64,

    /// Tint color as hex string (for example `#ffffff`).
    pub color: String,

    /// Whether click ripples are rendered.
    pub click_effects: bool,

    /// Whether a motion-blur hint is emitted for fast movement.
    pub motion_blur: bool,

    /// Hide the cursor after a period without pointer activity.
    pub hide_when_idle: bool,

    /// Idle period before hiding, in milliseconds.
    pub idle_timeout_ms: f64,

    /// Temporal smoothing ("gliding") of the raw trace.
    pub gliding_enabled: bool,

    /// How quickly the glided cursor chases the raw position.
    /// Higher is snappier. Typical range 1-20.
    pub glide_speed: f64,

    /// Additional smoothing in `[0, 1)`; larger values lag more.
    pub glide_smoothness: f64,
}

impl Default for CursorEffectData {
    fn default() -> Self {
        Self {
            style: CursorStyle::Pointer,
            size: 1.0,
            color: "#ffffff".to_string(),
            click_effects: true,
            motion_blur: false,
            hide_when_idle: true,
            idle_timeout_ms: 3000.0,
            gliding_enabled: true,
            glide_speed: 8.0,
            glide_smoothness: 0.5,
        }
    }
}

/// Errors raised by effect validation.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("effect {effect_id}: end does not follow start")]
    EmptyRange { effect_id: String },

    #[error("effect {effect_id}: scale {scale} must be finite and >= 1")]
    InvalidScale { effect_id: String, scale: f64 },

    #[error("effect {effect_id}: intro + outro exceed the effect range")]
    RampsExceedRange { effect_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoom(start: f64, end: f64) -> ZoomEffect {
        ZoomEffect {
            id: "z1".to_string(),
            start_time_ms: start,
            end_time_ms: end,
            target: NormPoint::new(0.3, 0.3),
            scale: 2.0,
            intro_ms: 300.0,
            outro_ms: 300.0,
            follow: FollowStrategy::FixedPoint,
        }
    }

    #[test]
    fn test_valid_effect() {
        assert!(zoom(1000.0, 4000.0).validate().is_ok());
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(matches!(
            zoom(4000.0, 4000.0).validate(),
            Err(EffectError::EmptyRange { .. })
        ));
    }

    #[test]
    fn test_ramps_exceeding_range_rejected() {
        let mut effect = zoom(0.0, 500.0);
        effect.intro_ms = 300.0;
        effect.outro_ms = 300.0;
        assert!(matches!(
            effect.validate(),
            Err(EffectError::RampsExceedRange { .. })
        ));
    }

    #[test]
    fn test_contains_is_half_open() {
        let effect = zoom(1000.0, 4000.0);
        assert!(!effect.contains(999.9));
        assert!(effect.contains(1000.0));
        assert!(effect.contains(3999.9));
        assert!(!effect.contains(4000.0));
    }

    #[test]
    fn test_cursor_defaults() {
        let cursor = CursorEffectData::default();
        assert!(cursor.gliding_enabled);
        assert!(cursor.hide_when_idle);
        assert_eq!(cursor.idle_timeout_ms, 3000.0);
    }

    #[test]
    fn test_follow_strategy_serde_tag() {
        let effect = zoom(0.0, 1000.0);
        let json = serde_json::to_string(&effect).unwrap();
        assert!(json.contains("\"strategy\":\"fixed_point\""));
        let parsed: ZoomEffect = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.follow, FollowStrategy::FixedPoint);
    }
}
