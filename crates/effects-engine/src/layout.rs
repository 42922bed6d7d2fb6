//! Frame-exact layout of millisecond-timed clips onto the output grid.
//!
//! Frame boundaries are derived from a running cumulative cursor, never
//! from independently rounding each clip's own duration — rounding
//! `duration` and `next_start` separately is the classic way to open a
//! one-frame gap or overlap between adjacent clips. Within a contiguous
//! run of clips every boundary is rounded against the run's anchor, so
//! timeline-contiguous clips share a frame boundary exactly. An explicit
//! timeline gap starts a new run and is rounded to whole frames on its
//! own, since no continuity is required across it.

use screenreel_common::frame_duration_ms;
use screenreel_timeline_model::{TimelineError, Track};

/// Contiguity threshold between clips, in milliseconds.
const CONTIGUOUS_EPS_MS: f64 = 1e-6;

/// Frame range assigned to one clip: `[start_frame, end_frame)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipFrameRange {
    pub clip_id: String,
    pub start_frame: u64,
    pub end_frame: u64,
}

impl ClipFrameRange {
    pub fn duration_frames(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    pub fn contains(&self, frame: u64) -> bool {
        frame >= self.start_frame && frame < self.end_frame
    }
}

/// Lay out a track's clips onto the frame grid. Single pass, O(n).
///
/// The track is validated first: a clip with non-positive duration or
/// overlapping neighbors never reaches layout.
pub fn build_frame_layout(track: &Track, fps: u32) -> Result<Vec<ClipFrameRange>, TimelineError> {
    track.validate()?;

    let frame_ms = frame_duration_ms(fps);
    let mut layout = Vec::with_capacity(track.clips.len());

    // Anchor of the current contiguous run: the timeline ms and frame
    // index where the run began. Boundaries inside the run are rounded
    // against this anchor.
    let mut run_anchor_ms = 0.0;
    let mut run_anchor_frame = 0u64;
    let mut prev_end_ms = 0.0;
    let mut prev_end_frame = 0u64;

    for (idx, clip) in track.clips.iter().enumerate() {
        let gap_ms = clip.start_time_ms - prev_end_ms;
        let start_frame = if idx == 0 {
            run_anchor_ms = clip.start_time_ms;
            run_anchor_frame = (clip.start_time_ms / frame_ms).round() as u64;
            run_anchor_frame
        } else if gap_ms > CONTIGUOUS_EPS_MS {
            // Explicit gap: round it independently and start a new run.
            run_anchor_ms = clip.start_time_ms;
            run_anchor_frame = prev_end_frame + (gap_ms / frame_ms).round() as u64;
            run_anchor_frame
        } else {
            // Contiguous with the previous clip: the cumulative cursor is
            // the boundary, by construction.
            prev_end_frame
        };

        let end_frame = run_anchor_frame
            + ((clip.end_time_ms() - run_anchor_ms) / frame_ms).round().max(0.0) as u64;
        // A clip shorter than half a frame still occupies one frame.
        let end_frame = end_frame.max(start_frame + 1);

        prev_end_ms = clip.end_time_ms();
        prev_end_frame = end_frame;

        layout.push(ClipFrameRange {
            clip_id: clip.id.clone(),
            start_frame,
            end_frame,
        });
    }

    Ok(layout)
}

/// Find the layout entry containing a frame, if any.
pub fn range_containing(layout: &[ClipFrameRange], frame: u64) -> Option<&ClipFrameRange> {
    layout.iter().find(|r| r.contains(frame))
}
