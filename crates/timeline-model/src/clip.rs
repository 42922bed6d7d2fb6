//! Clips, tracks, and time-remap periods.
//!
//! A clip occupies `[start_time_ms, start_time_ms + duration_ms)` on the
//! project timeline and plays the source range
//! `[source_in_ms, source_out_ms)` of its recording. Optional time-remap
//! periods subdivide the source range into spans played at distinct speeds.

use serde::{Deserialize, Serialize};

/// Tolerance for the remap duration-sum invariant (milliseconds).
const REMAP_DURATION_EPS_MS: f64 = 1e-3;

/// Tolerance for contiguity checks between adjacent spans (milliseconds).
const CONTIGUITY_EPS_MS: f64 = 1e-6;

/// A contiguous sub-range of a clip's source time played back at a
/// distinct speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRemapPeriod {
    pub source_start_ms: f64,
    pub source_end_ms: f64,

    /// Playback speed within this span; 2.0 plays twice as fast.
    pub speed_multiplier: f64,
}

impl TimeRemapPeriod {
    pub fn new(source_start_ms: f64, source_end_ms: f64, speed_multiplier: f64) -> Self {
        Self {
            source_start_ms,
            source_end_ms,
            speed_multiplier,
        }
    }

    /// Source span covered by this period.
    pub fn source_span_ms(&self) -> f64 {
        self.source_end_ms - self.source_start_ms
    }

    /// Output (timeline) duration this period occupies after speed-up.
    pub fn output_duration_ms(&self) -> f64 {
        self.source_span_ms() / self.speed_multiplier
    }
}

/// A millisecond-timed clip on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,

    /// The recording this clip plays.
    pub recording_id: String,

    /// Timeline position in milliseconds.
    pub start_time_ms: f64,

    /// Timeline duration in milliseconds. Always > 0 for a valid clip.
    pub duration_ms: f64,

    /// Trim-in on the source axis. `None` defaults to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_in_ms: Option<f64>,

    /// Trim-out on the source axis. `None` defaults to the untrimmed end
    /// implied by duration and playback rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_out_ms: Option<f64>,

    /// Constant playback rate, ignored within remap periods.
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,

    /// Variable-speed periods partitioning the source range, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remap_periods: Option<Vec<TimeRemapPeriod>>,
}

fn default_playback_rate() -> f64 {
    1.0
}

impl Clip {
    /// Create a plain clip with default source range and unit rate.
    pub fn new(
        id: impl Into<String>,
        recording_id: impl Into<String>,
        start_time_ms: f64,
        duration_ms: f64,
    ) -> Self {
        Self {
            id: id.into(),
            recording_id: recording_id.into(),
            start_time_ms,
            duration_ms,
            source_in_ms: None,
            source_out_ms: None,
            playback_rate: 1.0,
            time_remap_periods: None,
        }
    }

    /// Timeline end of the clip.
    pub fn end_time_ms(&self) -> f64 {
        self.start_time_ms + self.duration_ms
    }

    /// Effective trim-in: explicit value or 0.
    pub fn effective_source_in(&self) -> f64 {
        self.source_in_ms.unwrap_or(0.0)
    }

    /// Effective trim-out: explicit value or the untrimmed end implied by
    /// duration and playback rate.
    pub fn effective_source_out(&self) -> f64 {
        self.source_out_ms
            .unwrap_or_else(|| self.effective_source_in() + self.duration_ms * self.playback_rate)
    }

    /// Validate the clip's structural invariants.
    pub fn validate(&self) -> Result<(), TimelineError> {
        if !(self.start_time_ms >= 0.0) {
            return Err(TimelineError::NegativeStartTime {
                clip_id: self.id.clone(),
                start_time_ms: self.start_time_ms,
            });
        }
        if !(self.duration_ms > 0.0) {
            return Err(TimelineError::NonPositiveDuration {
                clip_id: self.id.clone(),
                duration_ms: self.duration_ms,
            });
        }

        let source_in = self.effective_source_in();
        let source_out = self.effective_source_out();
        if !(source_out > source_in) {
            return Err(TimelineError::InvalidSourceRange {
                clip_id: self.id.clone(),
                source_in_ms: source_in,
                source_out_ms: source_out,
            });
        }

        if !(self.playback_rate > 0.0) {
            return Err(TimelineError::InvalidPlaybackRate {
                clip_id: self.id.clone(),
                rate: self.playback_rate,
            });
        }

        if let Some(periods) = &self.time_remap_periods {
            self.validate_remap_periods(periods, source_in, source_out)?;
        }

        Ok(())
    }

    fn validate_remap_periods(
        &self,
        periods: &[TimeRemapPeriod],
        source_in: f64,
        source_out: f64,
    ) -> Result<(), TimelineError> {
        if periods.is_empty() {
            return Err(TimelineError::EmptyRemapPeriods {
                clip_id: self.id.clone(),
            });
        }

        for (idx, period) in periods.iter().enumerate() {
            if !(period.speed_multiplier > 0.0) {
                return Err(TimelineError::InvalidSpeedMultiplier {
                    clip_id: self.id.clone(),
                    index: idx,
                    multiplier: period.speed_multiplier,
                });
            }
            if !(period.source_end_ms > period.source_start_ms) {
                return Err(TimelineError::RemapNotContiguous {
                    clip_id: self.id.clone(),
                    index: idx,
                });
            }
        }

        // Periods must partition [source_in, source_out] without gaps.
        if (periods[0].source_start_ms - source_in).abs() > CONTIGUITY_EPS_MS
            || (periods.last().unwrap().source_end_ms - source_out).abs() > CONTIGUITY_EPS_MS
        {
            return Err(TimelineError::RemapNotContiguous {
                clip_id: self.id.clone(),
                index: 0,
            });
        }
        for (idx, pair) in periods.windows(2).enumerate() {
            if (pair[0].source_end_ms - pair[1].source_start_ms).abs() > CONTIGUITY_EPS_MS {
                return Err(TimelineError::RemapNotContiguous {
                    clip_id: self.id.clone(),
                    index: idx + 1,
                });
            }
        }

        let output_sum: f64 = periods.iter().map(TimeRemapPeriod::output_duration_ms).sum();
        if (output_sum - self.duration_ms).abs() > REMAP_DURATION_EPS_MS {
            return Err(TimelineError::RemapDurationMismatch {
                clip_id: self.id.clone(),
                expected_ms: self.duration_ms,
                actual_ms: output_sum,
            });
        }

        Ok(())
    }

    /// Split this clip at a clip-local output time, producing the left and
    /// right halves. Unset source ranges are default-filled first, so a
    /// plain 8000 ms clip split at 4000 yields source ranges `[0, 4000)`
    /// and `[4000, 8000)`.
    pub fn split_at(&self, local_ms: f64) -> Result<(Clip, Clip), TimelineError> {
        self.validate()?;

        if self.time_remap_periods.is_some() {
            return Err(TimelineError::SplitAcrossRemap {
                clip_id: self.id.clone(),
            });
        }
        if !(local_ms > 0.0 && local_ms < self.duration_ms) {
            return Err(TimelineError::SplitOutOfRange {
                clip_id: self.id.clone(),
                at_ms: local_ms,
            });
        }

        let source_in = self.effective_source_in();
        let source_out = self.effective_source_out();
        let source_split = source_in + local_ms * self.playback_rate;

        let left = Clip {
            id: format!("{}.1", self.id),
            duration_ms: local_ms,
            source_in_ms: Some(source_in),
            source_out_ms: Some(source_split),
            ..self.clone()
        };
        let right = Clip {
            id: format!("{}.2", self.id),
            start_time_ms: self.start_time_ms + local_ms,
            duration_ms: self.duration_ms - local_ms,
            source_in_ms: Some(source_split),
            source_out_ms: Some(source_out),
            ..self.clone()
        };

        Ok((left, right))
    }
}

/// An ordered sequence of non-overlapping clips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(id: impl Into<String>, clips: Vec<Clip>) -> Self {
        Self {
            id: id.into(),
            clips,
        }
    }

    /// Validate every clip and the non-overlap invariant between
    /// consecutive clips in timeline order.
    pub fn validate(&self) -> Result<(), TimelineError> {
        for clip in &self.clips {
            clip.validate()?;
        }

        for pair in self.clips.windows(2) {
            if pair[1].start_time_ms < pair[0].end_time_ms() - CONTIGUITY_EPS_MS {
                return Err(TimelineError::OverlappingClips {
                    track_id: self.id.clone(),
                    first: pair[0].id.clone(),
                    second: pair[1].id.clone(),
                });
            }
        }

        Ok(())
    }

    /// The clip active at a timeline millisecond, if any.
    pub fn clip_at(&self, timeline_ms: f64) -> Option<&Clip> {
        self.clips
            .iter()
            .find(|c| timeline_ms >= c.start_time_ms && timeline_ms < c.end_time_ms())
    }
}

/// Errors raised by timeline model validation.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("clip {clip_id}: duration {duration_ms} ms is not positive")]
    NonPositiveDuration { clip_id: String, duration_ms: f64 },

    #[error("clip {clip_id}: timeline start {start_time_ms} ms is negative")]
    NegativeStartTime { clip_id: String, start_time_ms: f64 },

    #[error("clip {clip_id}: source range [{source_in_ms}, {source_out_ms}) is empty or inverted")]
    InvalidSourceRange {
        clip_id: String,
        source_in_ms: f64,
        source_out_ms: f64,
    },

    #[error("clip {clip_id}: playback rate {rate} is not positive")]
    InvalidPlaybackRate { clip_id: String, rate: f64 },

    #[error("clip {clip_id}: remap period list is empty")]
    EmptyRemapPeriods { clip_id: String },

    #[error("clip {clip_id}: remap period {index} breaks source contiguity")]
    RemapNotContiguous { clip_id: String, index: usize },

    #[error("clip {clip_id}: remap period {index} has non-positive speed {multiplier}")]
    InvalidSpeedMultiplier {
        clip_id: String,
        index: usize,
        multiplier: f64,
    },

    #[error(
        "clip {clip_id}: remap output durations sum to {actual_ms} ms, expected {expected_ms} ms"
    )]
    RemapDurationMismatch {
        clip_id: String,
        expected_ms: f64,
        actual_ms: f64,
    },

    #[error("clip {clip_id}: split point {at_ms} ms is outside (0, duration)")]
    SplitOutOfRange { clip_id: String, at_ms: f64 },

    #[error("clip {clip_id}: cannot split a clip carrying time-remap periods")]
    SplitAcrossRemap { clip_id: String },

    #[error("track {track_id}: clips {first} and {second} overlap on the timeline")]
    OverlappingClips {
        track_id: String,
        first: String,
        second: String,
    },
}
