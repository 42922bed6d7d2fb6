//! Camera (zoom/pan) state calculator.
//!
//! Each zoom effect runs a phase machine `Idle → Intro → Hold → Outro →
//! Idle` against the requested timeline time. The zoom scale ramps with
//! ease-in-out over the intro and outro; the zoom center chases a target
//! with a critically-tuned damped spring.
//!
//! # Target
//!
//! Fixed-point effects aim at their stored target. Mouse-follow effects
//! aim at the interpolated pointer position at the corresponding source
//! time, passed through a dead zone (no reaction near screen center) and
//! an edge-resistance band (half-strength pan near capture boundaries).
//!
//! # Integration
//!
//! Semi-implicit Euler, substepped so stiffness never depends on frame
//! rate. The elapsed delta is clamped to a maximum before integration; a
//! stalled preview or a coarse export sampling rate must not destabilize
//! the spring. A backwards time step reseeds the state instead of
//! integrating a negative delta.
//!
//! The full state is `CameraPhysicsState` — position, velocity and last
//! evaluation times. It is small, serializable, and sufficient to resume
//! evaluation at any frame boundary, which is what allows export chunks
//! to be computed independently from a seed snapshot.

use serde::{Deserialize, Serialize};

use screenreel_timeline_model::{EventTrace, FollowStrategy, NormPoint, ZoomEffect};

/// Spring and target-shaping constants for the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Spring stiffness toward the target.
    pub tension: f64,

    /// Velocity damping. The default is `2 * sqrt(tension)`, the critical
    /// value: fastest approach with no overshoot.
    pub friction: f64,

    /// Maximum elapsed time accepted per evaluation, in milliseconds.
    pub max_delta_ms: f64,

    /// Maximum integration substep, in milliseconds.
    pub max_substep_ms: f64,

    /// Radius around screen center where pointer motion does not move
    /// the camera, in normalized units.
    pub dead_zone_radius: f64,

    /// Width of the edge band where panning runs at half strength.
    pub edge_margin: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        let tension = 120.0;
        Self {
            tension,
            friction: 2.0 * tension.sqrt(),
            max_delta_ms: 100.0,
            max_substep_ms: 4.0,
            dead_zone_radius: 0.08,
            edge_margin: 0.15,
        }
    }
}

/// The bounded physics state handed between evaluations and across
/// export chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPhysicsState {
    pub position: NormPoint,
    pub velocity_x: f64,
    pub velocity_y: f64,

    /// Timeline time of the last evaluation, in milliseconds.
    pub last_timeline_ms: f64,

    /// Source time of the last evaluation, in milliseconds.
    pub last_source_ms: f64,
}

impl CameraPhysicsState {
    /// Seed the spring at rest on a target.
    pub fn at_rest(position: NormPoint, timeline_ms: f64, source_ms: f64) -> Self {
        Self {
            position,
            velocity_x: 0.0,
            velocity_y: 0.0,
            last_timeline_ms: timeline_ms,
            last_source_ms: source_ms,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity_x.is_finite() && self.velocity_y.is_finite()
    }
}

/// Phase of a zoom effect at a given timeline time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomPhase {
    Idle,
    Intro,
    Hold,
    Outro,
}

/// Per-frame camera output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Zoom center in normalized capture coordinates.
    pub center: NormPoint,
    /// Zoom scale; 1.0 means no zoom.
    pub scale: f64,
}

impl CameraFrame {
    pub const NEUTRAL: CameraFrame = CameraFrame {
        center: NormPoint::CENTER,
        scale: 1.0,
    };
}

/// Stateless calculator; all mutable state lives in the caller-owned
/// `CameraPhysicsState`.
#[derive(Debug, Clone, Default)]
pub struct CameraCalculator {
    tuning: CameraTuning,
}

impl CameraCalculator {
    pub fn new(tuning: CameraTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &CameraTuning {
        &self.tuning
    }

    /// Phase of an effect at a timeline time.
    pub fn phase_at(&self, effect: &ZoomEffect, timeline_ms: f64) -> ZoomPhase {
        if !effect.contains(timeline_ms) {
            return ZoomPhase::Idle;
        }
        if timeline_ms < effect.start_time_ms + effect.intro_ms {
            ZoomPhase::Intro
        } else if timeline_ms < effect.end_time_ms - effect.outro_ms {
            ZoomPhase::Hold
        } else {
            ZoomPhase::Outro
        }
    }

    /// Zoom scale at a timeline time, eased over the intro and outro.
    pub fn scale_at(&self, effect: &ZoomEffect, timeline_ms: f64) -> f64 {
        let strength = match self.phase_at(effect, timeline_ms) {
            ZoomPhase::Idle => 0.0,
            ZoomPhase::Intro => {
                if effect.intro_ms > 0.0 {
                    ease_in_out_cubic((timeline_ms - effect.start_time_ms) / effect.intro_ms)
                } else {
                    1.0
                }
            }
            ZoomPhase::Hold => 1.0,
            ZoomPhase::Outro => {
                if effect.outro_ms > 0.0 {
                    ease_in_out_cubic((effect.end_time_ms - timeline_ms) / effect.outro_ms)
                } else {
                    1.0
                }
            }
        };
        1.0 + (effect.scale - 1.0) * strength
    }

    /// Spring target for an effect at a source time.
    pub fn target_for(&self, effect: &ZoomEffect, trace: &EventTrace, source_ms: f64) -> NormPoint {
        let raw = match effect.follow {
            FollowStrategy::FixedPoint => effect.target,
            FollowStrategy::MouseFollow => {
                trace.pointer_at(source_ms).unwrap_or(effect.target)
            }
        };
        self.shape_target(raw)
    }

    /// Evaluate the camera at a timeline/source time pair.
    ///
    /// `state` is seeded at the target on the first evaluation, reseeded
    /// on a backwards step, and advanced otherwise. With no active effect
    /// the state is dropped and the neutral frame is returned.
    pub fn evaluate(
        &self,
        effect: Option<&ZoomEffect>,
        trace: &EventTrace,
        timeline_ms: f64,
        source_ms: f64,
        state: &mut Option<CameraPhysicsState>,
    ) -> CameraFrame {
        let Some(effect) = effect else {
            *state = None;
            return CameraFrame::NEUTRAL;
        };

        let scale = self.scale_at(effect, timeline_ms);
        let target = self.target_for(effect, trace, source_ms);

        let current = match state {
            Some(s) if s.is_finite() && timeline_ms >= s.last_timeline_ms => s,
            _ => {
                // First evaluation, a backwards scrub, or a corrupted
                // state: seed at rest on the target instead of swooping
                // in from stale coordinates.
                *state = Some(CameraPhysicsState::at_rest(target, timeline_ms, source_ms));
                let frame = CameraFrame {
                    center: self.clamp_center(target, scale),
                    scale,
                };
                return frame;
            }
        };

        let delta_ms = (timeline_ms - current.last_timeline_ms).min(self.tuning.max_delta_ms);
        self.integrate(current, target, delta_ms);
        current.last_timeline_ms = timeline_ms;
        current.last_source_ms = source_ms;

        if !current.is_finite() {
            tracing::warn!(
                effect = %effect.id,
                timeline_ms,
                "Camera spring produced a non-finite state; reseeding at target"
            );
            *current = CameraPhysicsState::at_rest(target, timeline_ms, source_ms);
        }

        CameraFrame {
            center: self.clamp_center(current.position, scale),
            scale,
        }
    }

    /// Advance the spring by `delta_ms` toward `target` in fixed substeps.
    fn integrate(&self, state: &mut CameraPhysicsState, target: NormPoint, delta_ms: f64) {
        let mut remaining = delta_ms.max(0.0) / 1000.0;
        let substep = self.tuning.max_substep_ms / 1000.0;

        while remaining > 0.0 {
            let dt = remaining.min(substep);

            let ax = self.tuning.tension * (target.x - state.position.x)
                - self.tuning.friction * state.velocity_x;
            let ay = self.tuning.tension * (target.y - state.position.y)
                - self.tuning.friction * state.velocity_y;

            state.velocity_x += ax * dt;
            state.velocity_y += ay * dt;
            state.position.x += state.velocity_x * dt;
            state.position.y += state.velocity_y * dt;

            remaining -= dt;
        }
    }

    /// Apply the dead zone and edge resistance to a raw target.
    fn shape_target(&self, raw: NormPoint) -> NormPoint {
        let raw = raw.clamped();
        let dx = raw.x - NormPoint::CENTER.x;
        let dy = raw.y - NormPoint::CENTER.y;
        let dist = (dx * dx + dy * dy).sqrt();

        let dead = self.tuning.dead_zone_radius;
        let shaped = if dist <= dead {
            NormPoint::CENTER
        } else {
            // Rescale the offset so motion starts from zero at the dead
            // zone boundary rather than jumping.
            let effective = (dist - dead) / (1.0 - dead);
            NormPoint::new(
                NormPoint::CENTER.x + dx / dist * effective,
                NormPoint::CENTER.y + dy / dist * effective,
            )
        };

        NormPoint::new(
            edge_resist(shaped.x, self.tuning.edge_margin),
            edge_resist(shaped.y, self.tuning.edge_margin),
        )
    }

    /// Keep the zoom window inside the capture: at scale `s` the window
    /// half-extent is `0.5/s`, so the center must stay in
    /// `[half, 1 - half]`.
    fn clamp_center(&self, center: NormPoint, scale: f64) -> NormPoint {
        let half = 0.5 / scale.max(1.0);
        NormPoint::new(
            center.x.clamp(half, 1.0 - half),
            center.y.clamp(half, 1.0 - half),
        )
    }
}

/// Standard ease-in-out cubic on `[0, 1]`.
fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Pan at half strength inside the edge band.
fn edge_resist(v: f64, margin: f64) -> f64 {
    if v < margin {
        margin - (margin - v) * 0.5
    } else if v > 1.0 - margin {
        (1.0 - margin) + (v - (1.0 - margin)) * 0.5
    } else {
        v
    }
}
