//! Chunked export scheduling.
//!
//! The scheduler walks the chunk plan in timeline order. Each chunk body
//! runs on a blocking worker with no shared mutable state; the only
//! cross-chunk dependency is the `EvalState` snapshot carried from one
//! chunk's exit to the next chunk's seed, so chunk N+1 is issued strictly
//! after chunk N finishes. Frames are delivered to a caller-provided
//! `FrameSink` in order.
//!
//! Cancellation stops issuing further chunks; the partially evaluated
//! chunk is discarded, never written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use screenreel_common::{ScreenReelError, ScreenReelResult};
use screenreel_effects_engine::{EvalState, FrameEvaluator, RenderFrameParams};

use crate::chunks::{evaluate_chunk, plan_chunks, ChunkSeed};

/// Receives evaluated frames in output order.
pub trait FrameSink: Send {
    /// Deliver one frame's render parameters.
    fn write_frame(&mut self, params: &RenderFrameParams) -> ScreenReelResult<()>;

    /// Called once after the last frame of a completed export.
    fn finish(&mut self) -> ScreenReelResult<()> {
        Ok(())
    }
}

/// Progress callback for export scheduling.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames evaluated and written so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Cancelled,
}

/// Shared cancellation flag for an export run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Frames per chunk handed to a worker.
    pub chunk_size_frames: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            chunk_size_frames: 150,
        }
    }
}

/// Summary of a completed export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub frames_rendered: u64,
    pub chunks_rendered: usize,
}

/// Evaluate the full frame range chunk by chunk and stream the frames
/// into `sink`.
///
/// This is the main entry point for rendering.
pub async fn export_frames(
    evaluator: Arc<FrameEvaluator>,
    options: ExportOptions,
    mut sink: Box<dyn FrameSink>,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
) -> ScreenReelResult<ExportSummary> {
    let total_frames = evaluator.total_frames();
    let chunks = plan_chunks(total_frames, options.chunk_size_frames);

    tracing::info!(
        total_frames,
        chunks = chunks.len(),
        chunk_size = options.chunk_size_frames,
        "Starting chunked export"
    );

    if let Some(cb) = &progress {
        cb(ExportProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames,
            eta_secs: 0.0,
            stage: ExportStage::Preparing,
        });
    }

    let started = Instant::now();
    let mut frames_rendered = 0u64;
    let mut chunks_rendered = 0usize;
    let mut seed_state = EvalState::default();

    for chunk in chunks {
        if cancel.is_cancelled() {
            tracing::info!(chunk = chunk.index, "Export cancelled; discarding remaining chunks");
            if let Some(cb) = &progress {
                cb(report(frames_rendered, total_frames, &started, ExportStage::Cancelled));
            }
            return Err(ScreenReelError::export("Export cancelled"));
        }

        let seed = ChunkSeed {
            chunk,
            state: seed_state,
        };
        let worker_eval = Arc::clone(&evaluator);
        let result = tokio::task::spawn_blocking(move || evaluate_chunk(&worker_eval, seed))
            .await
            .map_err(|e| ScreenReelError::export(format!("Chunk worker failed: {e}")))?;

        seed_state = result.exit_state;
        for frame in &result.frames {
            sink.write_frame(frame)?;
        }
        frames_rendered += result.frames.len() as u64;
        chunks_rendered += 1;

        if let Some(cb) = &progress {
            cb(report(frames_rendered, total_frames, &started, ExportStage::Rendering));
        }
    }

    if let Some(cb) = &progress {
        cb(report(frames_rendered, total_frames, &started, ExportStage::Finalizing));
    }
    sink.finish()?;

    if let Some(cb) = &progress {
        cb(report(frames_rendered, total_frames, &started, ExportStage::Complete));
    }

    tracing::info!(frames_rendered, chunks_rendered, "Export complete");
    Ok(ExportSummary {
        frames_rendered,
        chunks_rendered,
    })
}

fn report(
    frames_rendered: u64,
    total_frames: u64,
    started: &Instant,
    stage: ExportStage,
) -> ExportProgress {
    let progress = if total_frames > 0 {
        frames_rendered as f64 / total_frames as f64
    } else {
        1.0
    };
    let elapsed = started.elapsed().as_secs_f64();
    let eta_secs = if frames_rendered > 0 && progress < 1.0 {
        elapsed / progress * (1.0 - progress)
    } else {
        0.0
    };
    ExportProgress {
        progress,
        frames_rendered,
        total_frames,
        eta_secs,
        stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use screenreel_timeline_model::{
        Clip, CursorEffectData, Recording, RecordingStore, Track,
    };

    struct CollectingSink {
        frames: Arc<Mutex<Vec<RenderFrameParams>>>,
        finished: Arc<AtomicBool>,
    }

    impl FrameSink for CollectingSink {
        fn write_frame(&mut self, params: &RenderFrameParams) -> ScreenReelResult<()> {
            self.frames.lock().unwrap().push(params.clone());
            Ok(())
        }

        fn finish(&mut self) -> ScreenReelResult<()> {
            self.finished.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn evaluator() -> Arc<FrameEvaluator> {
        let track = Track::new("t1", vec![Clip::new("a", "r1", 0.0, 10000.0)]);
        let recordings: RecordingStore =
            [Recording::new("r1", 1000, 1000, 10000.0)].into_iter().collect();
        Arc::new(
            FrameEvaluator::new(track, Vec::new(), CursorEffectData::default(), recordings, 30)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_export_streams_every_frame_in_order() {
        let eval = evaluator();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let finished = Arc::new(AtomicBool::new(false));
        let sink = Box::new(CollectingSink {
            frames: Arc::clone(&frames),
            finished: Arc::clone(&finished),
        });

        let summary = export_frames(
            Arc::clone(&eval),
            ExportOptions {
                chunk_size_frames: 64,
            },
            sink,
            None,
            CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.frames_rendered, eval.total_frames());
        assert!(finished.load(Ordering::Relaxed));

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len() as u64, eval.total_frames());
        for pair in frames.windows(2) {
            assert!(pair[0].timeline_ms < pair[1].timeline_ms);
        }
    }

    #[tokio::test]
    async fn test_progress_reaches_complete() {
        let eval = evaluator();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_cb = Arc::clone(&stages);
        let sink = Box::new(CollectingSink {
            frames: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(AtomicBool::new(false)),
        });

        export_frames(
            eval,
            ExportOptions::default(),
            sink,
            Some(Box::new(move |p| stages_cb.lock().unwrap().push(p.stage))),
            CancelToken::new(),
        )
        .await
        .unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&ExportStage::Preparing));
        assert_eq!(stages.last(), Some(&ExportStage::Complete));
        assert!(stages.contains(&ExportStage::Rendering));
    }

    #[tokio::test]
    async fn test_pre_cancelled_export_writes_nothing() {
        let eval = evaluator();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = Box::new(CollectingSink {
            frames: Arc::clone(&frames),
            finished: Arc::new(AtomicBool::new(false)),
        });

        let cancel = CancelToken::new();
        cancel.cancel();

        let err = export_frames(eval, ExportOptions::default(), sink, None, cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert!(frames.lock().unwrap().is_empty());
    }
}
