//! The frame evaluator: composition root of the effects engine.
//!
//! Ties the layout, source-time mapper, camera and cursor calculators
//! together behind one call: give it a frame index or timeline
//! millisecond plus an `EvalState`, get back the full render parameter
//! bundle for the compositor.
//!
//! Structural problems (invalid clips, invalid effects, a clip naming a
//! recording that is not in the store) are rejected when the evaluator is
//! built. At evaluation time nothing throws: degraded input produces the
//! neutral frame (scale 1, cursor hidden) and a warning, so playback
//! never dies mid-frame.

use serde::{Deserialize, Serialize};

use screenreel_common::frame_to_ms;
use screenreel_timeline_model::{
    CursorEffectData, EventTrace, NormPoint, RecordingStore, Track, ZoomEffect,
};

use crate::camera::{CameraCalculator, CameraPhysicsState, CameraTuning};
use crate::cursor::{ClickRipple, CursorCalculator, CursorKinematics, CursorTuning};
use crate::layout::{build_frame_layout, ClipFrameRange};
use crate::source_time::source_time_at;

/// Errors raised while building a `FrameEvaluator`.
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error(transparent)]
    Timeline(#[from] screenreel_timeline_model::TimelineError),

    #[error(transparent)]
    Effect(#[from] screenreel_timeline_model::EffectError),

    #[error("clip {clip_id} references recording {recording_id}, which is not loaded")]
    MissingRecording {
        clip_id: String,
        recording_id: String,
    },
}

/// Active-effect lookup at a timeline time.
///
/// The linear implementation scans the effect list; callers depend only
/// on this trait so a sorted-interval index can be substituted without
/// touching the calculators.
pub trait EffectIndex {
    fn active_zoom_at(&self, timeline_ms: f64) -> Option<&ZoomEffect>;
}

/// Linear scan over a small effect list.
///
/// When several effect ranges overlap, the one with the latest start
/// time wins. The tie-break is deterministic on purpose: preview and
/// export must agree on which effect drives the camera.
#[derive(Debug, Clone, Default)]
pub struct LinearEffectIndex {
    effects: Vec<ZoomEffect>,
}

impl LinearEffectIndex {
    pub fn new(effects: Vec<ZoomEffect>) -> Self {
        Self { effects }
    }

    pub fn effects(&self) -> &[ZoomEffect] {
        &self.effects
    }
}

impl EffectIndex for LinearEffectIndex {
    fn active_zoom_at(&self, timeline_ms: f64) -> Option<&ZoomEffect> {
        self.effects
            .iter()
            .filter(|e| e.contains(timeline_ms))
            .max_by(|a, b| a.start_time_ms.total_cmp(&b.start_time_ms))
    }
}

/// The complete mutable evaluation state: two bounded physics snapshots.
///
/// Serializable so an export chunk boundary can hand exactly this — and
/// nothing more — to the next chunk.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvalState {
    pub camera: Option<CameraPhysicsState>,
    pub cursor: Option<CursorKinematics>,
}

/// Render parameters for one output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrameParams {
    /// Requested timeline time in milliseconds.
    pub timeline_ms: f64,

    /// Clip under the playhead, if any.
    pub clip_id: Option<String>,

    /// Source-media timestamp to sample, `None` in a timeline gap.
    pub source_time_ms: Option<f64>,

    pub zoom_center: NormPoint,
    pub zoom_scale: f64,

    pub cursor_position: NormPoint,
    pub cursor_visible: bool,
    pub cursor_click: Option<ClickRipple>,
    pub cursor_motion_blur: bool,
}

impl RenderFrameParams {
    /// The frame emitted for gaps and degraded input.
    fn neutral(timeline_ms: f64) -> Self {
        Self {
            timeline_ms,
            clip_id: None,
            source_time_ms: None,
            zoom_center: NormPoint::CENTER,
            zoom_scale: 1.0,
            cursor_position: NormPoint::CENTER,
            cursor_visible: false,
            cursor_click: None,
            cursor_motion_blur: false,
        }
    }
}

/// Evaluates render parameters for a validated track.
#[derive(Debug, Clone)]
pub struct FrameEvaluator {
    track: Track,
    layout: Vec<ClipFrameRange>,
    effects: LinearEffectIndex,
    cursor_effect: CursorEffectData,
    recordings: RecordingStore,
    fps: u32,
    camera: CameraCalculator,
    cursor: CursorCalculator,
}

impl FrameEvaluator {
    /// Build an evaluator, validating everything up front.
    pub fn new(
        track: Track,
        effects: Vec<ZoomEffect>,
        cursor_effect: CursorEffectData,
        recordings: RecordingStore,
        fps: u32,
    ) -> Result<Self, EvaluatorError> {
        Self::with_tuning(
            track,
            effects,
            cursor_effect,
            recordings,
            fps,
            CameraTuning::default(),
            CursorTuning::default(),
        )
    }

    pub fn with_tuning(
        track: Track,
        effects: Vec<ZoomEffect>,
        cursor_effect: CursorEffectData,
        recordings: RecordingStore,
        fps: u32,
        camera_tuning: CameraTuning,
        cursor_tuning: CursorTuning,
    ) -> Result<Self, EvaluatorError> {
        let layout = build_frame_layout(&track, fps)?;
        for effect in &effects {
            effect.validate()?;
        }
        for clip in &track.clips {
            if !recordings.contains(&clip.recording_id) {
                return Err(EvaluatorError::MissingRecording {
                    clip_id: clip.id.clone(),
                    recording_id: clip.recording_id.clone(),
                });
            }
        }

        tracing::debug!(
            clips = track.clips.len(),
            effects = effects.len(),
            fps,
            "Built frame evaluator"
        );

        Ok(Self {
            track,
            layout,
            effects: LinearEffectIndex::new(effects),
            cursor_effect,
            recordings,
            fps,
            camera: CameraCalculator::new(camera_tuning),
            cursor: CursorCalculator::new(cursor_tuning),
        })
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn layout(&self) -> &[ClipFrameRange] {
        &self.layout
    }

    /// One past the last laid-out frame.
    pub fn total_frames(&self) -> u64 {
        self.layout.last().map(|r| r.end_frame).unwrap_or(0)
    }

    /// Evaluate the frame at an output frame index.
    pub fn evaluate_frame(&self, frame: u64, state: &mut EvalState) -> RenderFrameParams {
        self.evaluate_at(frame_to_ms(frame, self.fps), state)
    }

    /// Evaluate the frame at a timeline millisecond.
    pub fn evaluate_at(&self, timeline_ms: f64, state: &mut EvalState) -> RenderFrameParams {
        let Some(clip) = self.track.clip_at(timeline_ms) else {
            // Timeline gap: physics has nothing to follow, so it does not
            // carry across the gap either.
            state.camera = None;
            state.cursor = None;
            return RenderFrameParams::neutral(timeline_ms);
        };

        let Some(recording) = self.recordings.get(&clip.recording_id) else {
            // Unreachable after a successful build; degrade instead of
            // panicking if the store was swapped out from under us.
            tracing::warn!(
                clip = %clip.id,
                recording = %clip.recording_id,
                "Recording missing at evaluation time; emitting neutral frame"
            );
            state.camera = None;
            state.cursor = None;
            return RenderFrameParams::neutral(timeline_ms);
        };

        let local_ms = timeline_ms - clip.start_time_ms;
        let source_ms = source_time_at(clip, local_ms);
        let trace: &EventTrace = &recording.trace;

        let active = self.effects.active_zoom_at(timeline_ms);
        let camera = self
            .camera
            .evaluate(active, trace, timeline_ms, source_ms, &mut state.camera);
        let cursor = self
            .cursor
            .evaluate(&self.cursor_effect, trace, source_ms, &mut state.cursor);

        RenderFrameParams {
            timeline_ms,
            clip_id: Some(clip.id.clone()),
            source_time_ms: Some(source_ms),
            zoom_center: camera.center,
            zoom_scale: camera.scale,
            cursor_position: cursor.position,
            cursor_visible: cursor.visible,
            cursor_click: cursor.ripple,
            cursor_motion_blur: cursor.motion_blur,
        }
    }
}
