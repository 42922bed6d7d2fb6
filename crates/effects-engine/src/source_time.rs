//! Mapping clip-local output time to source-media time.
//!
//! Without remap periods the mapping is a single linear segment scaled by
//! the playback rate. With remap periods it is piecewise linear: each
//! period contributes `source_span / speed` of output time, and the local
//! output time is located within the cumulative output spans before
//! interpolating the corresponding source span. The mapping is continuous
//! at period boundaries and strictly monotonic in source time.

use screenreel_timeline_model::Clip;

/// Map a clip-local output time (milliseconds in `[0, duration]`) to a
/// source-media timestamp on the recording's axis.
///
/// Inputs a hair outside the range (frame-boundary float jitter) are
/// clamped; the clip is assumed validated.
pub fn source_time_at(clip: &Clip, local_output_ms: f64) -> f64 {
    let local = local_output_ms.clamp(0.0, clip.duration_ms);
    let source_in = clip.effective_source_in();

    let Some(periods) = &clip.time_remap_periods else {
        return source_in + local * clip.playback_rate;
    };

    let mut cumulative_output = 0.0;
    for period in periods {
        let output_span = period.output_duration_ms();
        if local <= cumulative_output + output_span {
            let fraction = if output_span > 0.0 {
                (local - cumulative_output) / output_span
            } else {
                0.0
            };
            return period.source_start_ms + fraction * period.source_span_ms();
        }
        cumulative_output += output_span;
    }

    // Past the last period by accumulated float error: clamp to the end.
    clip.effective_source_out()
}
