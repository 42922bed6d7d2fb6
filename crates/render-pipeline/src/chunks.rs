//! Chunk planning and pure chunk evaluation.
//!
//! The export frame range is split into fixed-size chunks. Each chunk is
//! a pure function of `(evaluator, frame range, seed snapshot)` — no
//! chunk reads another chunk's memory, and a chunk can be recomputed at
//! any later time from its recorded seed, which is what makes export
//! resumable.

use serde::{Deserialize, Serialize};

use screenreel_effects_engine::{EvalState, FrameEvaluator, RenderFrameParams};

/// A half-open frame range `[start_frame, end_frame)` in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameChunk {
    pub index: usize,
    pub start_frame: u64,
    pub end_frame: u64,
}

impl FrameChunk {
    pub fn len(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    pub fn is_empty(&self) -> bool {
        self.end_frame == self.start_frame
    }
}

/// Everything a worker needs to evaluate one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkSeed {
    pub chunk: FrameChunk,
    pub state: EvalState,
}

/// The frames of one evaluated chunk plus the snapshot that seeds the
/// next chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub chunk: FrameChunk,
    pub frames: Vec<RenderFrameParams>,
    pub exit_state: EvalState,
}

/// Split `[0, total_frames)` into chunks of at most `chunk_size` frames.
pub fn plan_chunks(total_frames: u64, chunk_size: u64) -> Vec<FrameChunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total_frames {
        let end = (start + chunk_size).min(total_frames);
        chunks.push(FrameChunk {
            index: chunks.len(),
            start_frame: start,
            end_frame: end,
        });
        start = end;
    }
    chunks
}

/// Evaluate every frame of a chunk from its seed.
pub fn evaluate_chunk(evaluator: &FrameEvaluator, seed: ChunkSeed) -> ChunkResult {
    let mut state = seed.state;
    let mut frames = Vec::with_capacity(seed.chunk.len() as usize);
    for frame in seed.chunk.start_frame..seed.chunk.end_frame {
        frames.push(evaluator.evaluate_frame(frame, &mut state));
    }
    ChunkResult {
        chunk: seed.chunk,
        frames,
        exit_state: state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenreel_timeline_model::{
        Clip, CursorEffectData, EventTrace, MouseSample, Recording, RecordingStore, TraceEvent,
        Track,
    };

    fn evaluator() -> FrameEvaluator {
        let events = (0..100)
            .map(|i| {
                TraceEvent::Mouse(MouseSample {
                    time_ms: i as f64 * 100.0,
                    x: 10.0 * i as f64,
                    y: 500.0,
                    capture_size: None,
                })
            })
            .collect();
        let recording = Recording::new("r1", 1000, 1000, 10000.0)
            .with_trace(EventTrace::from_events(1000, 1000, events));
        let track = Track::new("t1", vec![Clip::new("a", "r1", 0.0, 10000.0)]);
        let recordings: RecordingStore = [recording].into_iter().collect();
        FrameEvaluator::new(track, Vec::new(), CursorEffectData::default(), recordings, 30)
            .unwrap()
    }

    #[test]
    fn test_plan_covers_range_without_gaps() {
        let chunks = plan_chunks(301, 150);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_frame, 0);
        assert_eq!(chunks[2].end_frame, 301);
        assert_eq!(chunks[2].len(), 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_frame, pair[1].start_frame);
        }
    }

    #[test]
    fn test_plan_of_empty_range_is_empty() {
        assert!(plan_chunks(0, 150).is_empty());
    }

    #[test]
    fn test_chained_chunks_match_a_single_pass() {
        let eval = evaluator();
        let total = eval.total_frames();

        let mut state = EvalState::default();
        let single: Vec<_> = (0..total).map(|f| eval.evaluate_frame(f, &mut state)).collect();

        let mut chained = Vec::new();
        let mut seed_state = EvalState::default();
        for chunk in plan_chunks(total, 64) {
            let result = evaluate_chunk(
                &eval,
                ChunkSeed {
                    chunk,
                    state: seed_state,
                },
            );
            seed_state = result.exit_state;
            chained.extend(result.frames);
        }

        assert_eq!(chained, single);
    }

    #[test]
    fn test_chunk_is_recomputable_from_recorded_seed() {
        let eval = evaluator();
        let chunks = plan_chunks(eval.total_frames(), 100);

        let mut seed_state = EvalState::default();
        let mut seeds = Vec::new();
        let mut results = Vec::new();
        for chunk in &chunks {
            let seed = ChunkSeed {
                chunk: *chunk,
                state: seed_state,
            };
            seeds.push(seed);
            let result = evaluate_chunk(&eval, seed);
            seed_state = result.exit_state;
            results.push(result);
        }

        // Re-run the middle chunk out of order from its recorded seed.
        let replay = evaluate_chunk(&eval, seeds[1]);
        assert_eq!(replay, results[1]);
    }
}
