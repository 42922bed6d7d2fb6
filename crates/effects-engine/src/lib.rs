//! ScreenReel Effects Engine
//!
//! Converts a timeline description plus recorded input traces into
//! per-frame render parameters:
//! - **Frame Layout:** millisecond clips onto a gapless frame grid
//! - **Source Time:** clip-local output time to source-media time,
//!   including variable-speed remap periods
//! - **Speed Remap:** typing-speed detections into continuity-preserving
//!   remap periods
//! - **Camera:** spring-damped zoom/pan state driven by mouse motion
//! - **Cursor:** smoothed position, visibility, and click state
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data. Results are identical
//! whether frames are evaluated one at a time or in chunks seeded from
//! bounded physics snapshots.

pub mod camera;
pub mod cursor;
pub mod evaluator;
pub mod layout;
pub mod source_time;
pub mod speed_remap;

pub use camera::{CameraCalculator, CameraFrame, CameraPhysicsState, CameraTuning, ZoomPhase};
pub use cursor::{ClickRipple, CursorCalculator, CursorFrame, CursorKinematics, CursorTuning};
pub use evaluator::{
    EffectIndex, EvalState, EvaluatorError, FrameEvaluator, LinearEffectIndex, RenderFrameParams,
};
pub use layout::{build_frame_layout, range_containing, ClipFrameRange};
pub use source_time::source_time_at;
pub use speed_remap::{
    apply_speed_periods, apply_speed_periods_split, DetectedSpeedPeriod, SpeedRemapError,
};
