//! Typing-speed remap service.
//!
//! Activity detection (external to this crate) yields periods on a clip's
//! *source* axis that should play at a suggested speed — typically
//! fast-forwarding stretches of typing. This service turns those detected
//! periods into a continuity-preserving remap description: the gaps
//! between detections become normal-speed periods so the result fully
//! covers `[source_in, source_out]`, and the clip's new duration is the
//! sum of every period's output duration.
//!
//! Gaps shorter than one frame (`1000/fps` ms) cannot render as their own
//! period; they merge into the adjacent detected period instead of
//! surviving as degenerate micro-periods.
//!
//! Overlapping or out-of-range detections are rejected, not clamped —
//! silently clamping would alter user-visible timing.

use screenreel_common::frame_duration_ms;
use screenreel_timeline_model::{Clip, TimeRemapPeriod};

/// A detected activity period on the clip's source axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedSpeedPeriod {
    pub start_ms: f64,
    pub end_ms: f64,
    pub speed_multiplier: f64,
}

impl DetectedSpeedPeriod {
    pub fn new(start_ms: f64, end_ms: f64, speed_multiplier: f64) -> Self {
        Self {
            start_ms,
            end_ms,
            speed_multiplier,
        }
    }
}

/// Errors raised when detected periods cannot be applied to a clip.
#[derive(Debug, thiserror::Error)]
pub enum SpeedRemapError {
    #[error("clip {clip_id}: detected period [{start_ms}, {end_ms}) is empty or inverted")]
    EmptyPeriod {
        clip_id: String,
        start_ms: f64,
        end_ms: f64,
    },

    #[error("clip {clip_id}: detected period [{start_ms}, {end_ms}) has non-positive speed {multiplier}")]
    InvalidMultiplier {
        clip_id: String,
        start_ms: f64,
        end_ms: f64,
        multiplier: f64,
    },

    #[error(
        "clip {clip_id}: detected period [{start_ms}, {end_ms}) lies outside the source range [{source_in_ms}, {source_out_ms})"
    )]
    OutOfRange {
        clip_id: String,
        start_ms: f64,
        end_ms: f64,
        source_in_ms: f64,
        source_out_ms: f64,
    },

    #[error("clip {clip_id}: detected periods [{first_start_ms}, ...) and [{second_start_ms}, ...) overlap")]
    Overlapping {
        clip_id: String,
        first_start_ms: f64,
        second_start_ms: f64,
    },

    #[error(transparent)]
    Timeline(#[from] screenreel_timeline_model::TimelineError),
}

/// Apply detected periods to a clip, producing a single clip that carries
/// a full-coverage ordered `time_remap_periods` array and an updated
/// duration.
pub fn apply_speed_periods(
    clip: &Clip,
    detected: &[DetectedSpeedPeriod],
    fps: u32,
) -> Result<Clip, SpeedRemapError> {
    clip.validate()?;
    let periods = build_full_coverage(clip, detected, fps)?;
    let new_duration: f64 = periods.iter().map(TimeRemapPeriod::output_duration_ms).sum();

    let remapped = Clip {
        duration_ms: new_duration,
        source_in_ms: Some(clip.effective_source_in()),
        source_out_ms: Some(clip.effective_source_out()),
        playback_rate: 1.0,
        time_remap_periods: Some(periods),
        ..clip.clone()
    };
    remapped.validate()?;

    tracing::debug!(
        clip = %clip.id,
        old_duration_ms = clip.duration_ms,
        new_duration_ms = new_duration,
        periods = remapped.time_remap_periods.as_ref().map(Vec::len),
        "Applied speed remap periods"
    );

    Ok(remapped)
}

/// Legacy mode: apply detected periods by splitting the clip into
/// consecutive clips, each playing one period at a constant rate.
pub fn apply_speed_periods_split(
    clip: &Clip,
    detected: &[DetectedSpeedPeriod],
    fps: u32,
) -> Result<Vec<Clip>, SpeedRemapError> {
    clip.validate()?;
    let periods = build_full_coverage(clip, detected, fps)?;

    let mut clips = Vec::with_capacity(periods.len());
    let mut timeline_cursor = clip.start_time_ms;
    for (idx, period) in periods.iter().enumerate() {
        let duration = period.output_duration_ms();
        let split = Clip {
            id: format!("{}.{}", clip.id, idx + 1),
            start_time_ms: timeline_cursor,
            duration_ms: duration,
            source_in_ms: Some(period.source_start_ms),
            source_out_ms: Some(period.source_end_ms),
            playback_rate: period.speed_multiplier,
            time_remap_periods: None,
            ..clip.clone()
        };
        split.validate()?;
        timeline_cursor += duration;
        clips.push(split);
    }

    Ok(clips)
}

/// Build the ordered full-coverage period list for `[source_in,
/// source_out]`: detected periods plus synthesized normal-speed gaps,
/// with sub-frame gaps merged into the adjacent detection.
fn build_full_coverage(
    clip: &Clip,
    detected: &[DetectedSpeedPeriod],
    fps: u32,
) -> Result<Vec<TimeRemapPeriod>, SpeedRemapError> {
    let source_in = clip.effective_source_in();
    let source_out = clip.effective_source_out();
    let min_gap_ms = frame_duration_ms(fps);

    let mut sorted: Vec<DetectedSpeedPeriod> = detected.to_vec();
    sorted.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

    for period in &sorted {
        if !(period.end_ms > period.start_ms) {
            return Err(SpeedRemapError::EmptyPeriod {
                clip_id: clip.id.clone(),
                start_ms: period.start_ms,
                end_ms: period.end_ms,
            });
        }
        if !(period.speed_multiplier > 0.0) {
            return Err(SpeedRemapError::InvalidMultiplier {
                clip_id: clip.id.clone(),
                start_ms: period.start_ms,
                end_ms: period.end_ms,
                multiplier: period.speed_multiplier,
            });
        }
        if period.start_ms < source_in || period.end_ms > source_out {
            return Err(SpeedRemapError::OutOfRange {
                clip_id: clip.id.clone(),
                start_ms: period.start_ms,
                end_ms: period.end_ms,
                source_in_ms: source_in,
                source_out_ms: source_out,
            });
        }
    }
    for pair in sorted.windows(2) {
        if pair[1].start_ms < pair[0].end_ms {
            return Err(SpeedRemapError::Overlapping {
                clip_id: clip.id.clone(),
                first_start_ms: pair[0].start_ms,
                second_start_ms: pair[1].start_ms,
            });
        }
    }

    let mut periods: Vec<TimeRemapPeriod> = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = source_in;

    for detection in &sorted {
        let gap = detection.start_ms - cursor;
        let mut start = detection.start_ms;
        if gap >= min_gap_ms {
            periods.push(TimeRemapPeriod::new(cursor, detection.start_ms, 1.0));
        } else if gap > 0.0 {
            // Sub-frame gap: absorb it into the following detection.
            start = cursor;
        }
        periods.push(TimeRemapPeriod::new(
            start,
            detection.end_ms,
            detection.speed_multiplier,
        ));
        cursor = detection.end_ms;
    }

    let tail = source_out - cursor;
    if periods.is_empty() {
        // No detections at all: the whole range plays at normal speed.
        periods.push(TimeRemapPeriod::new(source_in, source_out, 1.0));
    } else if tail >= min_gap_ms {
        periods.push(TimeRemapPeriod::new(cursor, source_out, 1.0));
    } else if tail > 0.0 {
        // Sub-frame trailing gap: absorb it into the last period.
        if let Some(last) = periods.last_mut() {
            last.source_end_ms = source_out;
        }
    }

    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_clip(duration_ms: f64) -> Clip {
        Clip::new("c1", "r1", 0.0, duration_ms)
    }

    #[test]
    fn test_single_fast_period_worked_example() {
        // 10000 ms clip, [2000, 4000] at 2x => 9000 ms, three periods.
        let clip = source_clip(10000.0);
        let remapped = apply_speed_periods(
            &clip,
            &[DetectedSpeedPeriod::new(2000.0, 4000.0, 2.0)],
            30,
        )
        .unwrap();

        assert_eq!(remapped.duration_ms, 9000.0);
        let periods = remapped.time_remap_periods.as_ref().unwrap();
        assert_eq!(
            periods,
            &vec![
                TimeRemapPeriod::new(0.0, 2000.0, 1.0),
                TimeRemapPeriod::new(2000.0, 4000.0, 2.0),
                TimeRemapPeriod::new(4000.0, 10000.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_two_fast_periods_worked_example() {
        // [2000,4000]@2x and [6000,8000]@4x => 7500 ms, five periods N,F,N,F,N.
        let clip = source_clip(10000.0);
        let remapped = apply_speed_periods(
            &clip,
            &[
                DetectedSpeedPeriod::new(2000.0, 4000.0, 2.0),
                DetectedSpeedPeriod::new(6000.0, 8000.0, 4.0),
            ],
            30,
        )
        .unwrap();

        assert_eq!(remapped.duration_ms, 7500.0);
        let periods = remapped.time_remap_periods.as_ref().unwrap();
        assert_eq!(periods.len(), 5);
        let speeds: Vec<f64> = periods.iter().map(|p| p.speed_multiplier).collect();
        assert_eq!(speeds, vec![1.0, 2.0, 1.0, 4.0, 1.0]);
    }

    #[test]
    fn test_period_continuity_invariant() {
        let clip = source_clip(10000.0);
        let remapped = apply_speed_periods(
            &clip,
            &[
                DetectedSpeedPeriod::new(1000.0, 2000.0, 3.0),
                DetectedSpeedPeriod::new(5000.0, 9000.0, 2.0),
            ],
            30,
        )
        .unwrap();

        let periods = remapped.time_remap_periods.as_ref().unwrap();
        for pair in periods.windows(2) {
            assert_eq!(pair[0].source_end_ms, pair[1].source_start_ms);
        }
    }

    #[test]
    fn test_sub_frame_leading_gap_merges_forward() {
        // 10 ms gap before the detection is under one 30fps frame (33.3 ms).
        let clip = source_clip(10000.0);
        let remapped = apply_speed_periods(
            &clip,
            &[DetectedSpeedPeriod::new(10.0, 4000.0, 2.0)],
            30,
        )
        .unwrap();

        let periods = remapped.time_remap_periods.as_ref().unwrap();
        assert_eq!(periods[0].source_start_ms, 0.0);
        assert_eq!(periods[0].speed_multiplier, 2.0);
        assert_eq!(periods.len(), 2);
    }

    #[test]
    fn test_sub_frame_trailing_gap_merges_backward() {
        let clip = source_clip(10000.0);
        let remapped = apply_speed_periods(
            &clip,
            &[DetectedSpeedPeriod::new(2000.0, 9990.0, 2.0)],
            30,
        )
        .unwrap();

        let periods = remapped.time_remap_periods.as_ref().unwrap();
        assert_eq!(periods.last().unwrap().source_end_ms, 10000.0);
        assert_eq!(periods.last().unwrap().speed_multiplier, 2.0);
        assert_eq!(periods.len(), 2);
    }

    #[test]
    fn test_no_detections_yields_single_normal_period() {
        let clip = source_clip(8000.0);
        let remapped = apply_speed_periods(&clip, &[], 30).unwrap();
        assert_eq!(remapped.duration_ms, 8000.0);
        assert_eq!(
            remapped.time_remap_periods.as_ref().unwrap(),
            &vec![TimeRemapPeriod::new(0.0, 8000.0, 1.0)]
        );
    }

    #[test]
    fn test_overlapping_detections_rejected() {
        let clip = source_clip(10000.0);
        let err = apply_speed_periods(
            &clip,
            &[
                DetectedSpeedPeriod::new(2000.0, 5000.0, 2.0),
                DetectedSpeedPeriod::new(4000.0, 8000.0, 2.0),
            ],
            30,
        )
        .unwrap_err();
        assert!(matches!(err, SpeedRemapError::Overlapping { .. }));
    }

    #[test]
    fn test_out_of_range_detection_rejected() {
        let clip = source_clip(10000.0);
        let err = apply_speed_periods(
            &clip,
            &[DetectedSpeedPeriod::new(9000.0, 11000.0, 2.0)],
            30,
        )
        .unwrap_err();
        assert!(matches!(err, SpeedRemapError::OutOfRange { .. }));
    }

    #[test]
    fn test_non_positive_multiplier_rejected() {
        let clip = source_clip(10000.0);
        let err = apply_speed_periods(
            &clip,
            &[DetectedSpeedPeriod::new(2000.0, 4000.0, 0.0)],
            30,
        )
        .unwrap_err();
        assert!(matches!(err, SpeedRemapError::InvalidMultiplier { .. }));
    }

    #[test]
    fn test_legacy_split_mode() {
        let clip = source_clip(10000.0);
        let clips = apply_speed_periods_split(
            &clip,
            &[DetectedSpeedPeriod::new(2000.0, 4000.0, 2.0)],
            30,
        )
        .unwrap();

        assert_eq!(clips.len(), 3);
        assert_eq!(clips[0].playback_rate, 1.0);
        assert_eq!(clips[1].playback_rate, 2.0);
        assert_eq!(clips[1].duration_ms, 1000.0);
        assert_eq!(clips[2].start_time_ms, 3000.0);
        // Split clips stay timeline-contiguous.
        for pair in clips.windows(2) {
            assert_eq!(pair[0].end_time_ms(), pair[1].start_time_ms);
        }
        // Total output matches the single-clip mode.
        let total: f64 = clips.iter().map(|c| c.duration_ms).sum();
        assert_eq!(total, 9000.0);
    }

    #[test]
    fn test_remapped_clip_passes_model_validation() {
        let clip = source_clip(10000.0);
        let remapped = apply_speed_periods(
            &clip,
            &[
                DetectedSpeedPeriod::new(100.0, 1500.0, 1.5),
                DetectedSpeedPeriod::new(1520.0, 9000.0, 3.0),
            ],
            30,
        )
        .unwrap();
        assert!(remapped.validate().is_ok());
    }
}
