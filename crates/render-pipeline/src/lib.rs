//! ScreenReel Render Pipeline
//!
//! Drives the effects engine in its two evaluation modes:
//! - **Export:** the frame range is planned into chunks, each evaluated
//!   on a blocking worker from a bounded seed snapshot, with frames
//!   streamed in order to a `FrameSink`
//! - **Preview:** a cooperative single-threaded session advancing the
//!   playhead by clamped wall-clock deltas
//!
//! Both modes share the same `FrameEvaluator`, which is what guarantees
//! a preview frame and the exported frame at the same timeline time
//! carry identical render parameters.

pub mod chunks;
pub mod export;
pub mod preview;

pub use chunks::{evaluate_chunk, plan_chunks, ChunkResult, ChunkSeed, FrameChunk};
pub use export::{
    export_frames, CancelToken, ExportOptions, ExportProgress, ExportStage, ExportSummary,
    FrameSink, ProgressCallback,
};
pub use preview::PreviewSession;
