//! Input event types for recorded device traces.
//!
//! Every sample is timestamped in milliseconds on the *recording's own
//! source-time axis* — not the edited project timeline. Positions are in
//! capture pixels; an optional per-sample capture size lets traces from
//! resized captures normalize correctly.

use serde::{Deserialize, Serialize};

use crate::geometry::NormPoint;

/// Millisecond timestamp on a recording's source-time axis.
pub type SourceMs = f64;

/// A recorded mouse position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseSample {
    /// Milliseconds since recording start.
    #[serde(rename = "t")]
    pub time_ms: SourceMs,

    /// X position in capture pixels.
    pub x: f64,

    /// Y position in capture pixels.
    pub y: f64,

    /// Capture dimensions at sample time, when they differ from the
    /// recording's nominal size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_size: Option<(u32, u32)>,
}

/// A recorded mouse click sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickSample {
    /// Milliseconds since recording start.
    #[serde(rename = "t")]
    pub time_ms: SourceMs,

    /// X position in capture pixels.
    pub x: f64,

    /// Y position in capture pixels.
    pub y: f64,

    /// Which button was pressed.
    pub button: MouseButton,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_size: Option<(u32, u32)>,
}

/// A recorded keyboard sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySample {
    /// Milliseconds since recording start.
    #[serde(rename = "t")]
    pub time_ms: SourceMs,

    /// Key code (e.g., "KeyA", "Enter", "ShiftLeft").
    pub code: String,
}

/// A recorded scroll sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    /// Milliseconds since recording start.
    #[serde(rename = "t")]
    pub time_ms: SourceMs,

    /// Scroll deltas in capture pixels.
    pub dx: f64,
    pub dy: f64,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Discriminated union used by the JSONL trace format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    Mouse(MouseSample),
    Click(ClickSample),
    Key(KeySample),
    Scroll(ScrollSample),
}

impl TraceEvent {
    /// Timestamp of the event, whatever its kind.
    pub fn time_ms(&self) -> SourceMs {
        match self {
            TraceEvent::Mouse(s) => s.time_ms,
            TraceEvent::Click(s) => s.time_ms,
            TraceEvent::Key(s) => s.time_ms,
            TraceEvent::Scroll(s) => s.time_ms,
        }
    }
}

/// The complete recorded input trace of one recording, split by kind and
/// sorted by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTrace {
    /// Nominal capture width in pixels (used to normalize positions).
    pub capture_width: u32,

    /// Nominal capture height in pixels.
    pub capture_height: u32,

    pub mouse: Vec<MouseSample>,
    pub clicks: Vec<ClickSample>,

    #[serde(default)]
    pub keys: Vec<KeySample>,

    #[serde(default)]
    pub scrolls: Vec<ScrollSample>,
}

impl EventTrace {
    /// Build a trace from a flat event list, splitting by kind and sorting
    /// each stream by timestamp.
    pub fn from_events(capture_width: u32, capture_height: u32, events: Vec<TraceEvent>) -> Self {
        let mut trace = Self {
            capture_width,
            capture_height,
            ..Default::default()
        };

        for event in events {
            match event {
                TraceEvent::Mouse(s) => trace.mouse.push(s),
                TraceEvent::Click(s) => trace.clicks.push(s),
                TraceEvent::Key(s) => trace.keys.push(s),
                TraceEvent::Scroll(s) => trace.scrolls.push(s),
            }
        }

        trace.mouse.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        trace.clicks.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        trace.keys.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        trace
            .scrolls
            .sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        trace
    }

    /// Whether the trace has any pointer data at all.
    pub fn is_empty(&self) -> bool {
        self.mouse.is_empty() && self.clicks.is_empty()
    }

    /// Normalize a capture-pixel position against the sample's own capture
    /// size when present, else the trace's nominal size.
    pub fn normalize(&self, x: f64, y: f64, sample_size: Option<(u32, u32)>) -> NormPoint {
        let (w, h) = sample_size.unwrap_or((self.capture_width, self.capture_height));
        NormPoint::new(x / w.max(1) as f64, y / h.max(1) as f64).clamped()
    }

    /// Interpolated normalized pointer position at `time_ms`.
    ///
    /// Times before the first sample clamp to it; times after the last
    /// clamp to the last. Returns `None` for an empty mouse stream.
    pub fn pointer_at(&self, time_ms: SourceMs) -> Option<NormPoint> {
        if self.mouse.is_empty() {
            return None;
        }

        let first = &self.mouse[0];
        if time_ms <= first.time_ms {
            return Some(self.normalize(first.x, first.y, first.capture_size));
        }

        let last = self.mouse.last().unwrap();
        if time_ms >= last.time_ms {
            return Some(self.normalize(last.x, last.y, last.capture_size));
        }

        let idx = self
            .mouse
            .partition_point(|s| s.time_ms <= time_ms)
            .saturating_sub(1);
        let a = &self.mouse[idx];
        let b = &self.mouse[idx + 1];

        let span = b.time_ms - a.time_ms;
        if span < 1e-6 {
            return Some(self.normalize(a.x, a.y, a.capture_size));
        }

        let t = (time_ms - a.time_ms) / span;
        let pa = self.normalize(a.x, a.y, a.capture_size);
        let pb = self.normalize(b.x, b.y, b.capture_size);
        Some(NormPoint::lerp(&pa, &pb, t))
    }

    /// Timestamp of the most recent pointer *activity* at or before
    /// `time_ms`: a mouse sample that actually moved (beyond `eps_norm`
    /// normalized units from its predecessor) or any click.
    pub fn last_activity_before(&self, time_ms: SourceMs, eps_norm: f64) -> Option<SourceMs> {
        let last_click = self
            .clicks
            .iter()
            .rev()
            .find(|c| c.time_ms <= time_ms)
            .map(|c| c.time_ms);

        let end = self.mouse.partition_point(|s| s.time_ms <= time_ms);
        let mut last_move = None;
        for i in (1..end).rev() {
            let prev = &self.mouse[i - 1];
            let curr = &self.mouse[i];
            let pa = self.normalize(prev.x, prev.y, prev.capture_size);
            let pb = self.normalize(curr.x, curr.y, curr.capture_size);
            if pa.distance_to(&pb) > eps_norm {
                last_move = Some(curr.time_ms);
                break;
            }
        }
        // A trace that starts inside the window counts as activity at its
        // first sample.
        if last_move.is_none() && end > 0 {
            last_move = Some(self.mouse[0].time_ms);
        }

        match (last_move, last_click) {
            (Some(m), Some(c)) => Some(m.max(c)),
            (Some(m), None) => Some(m),
            (None, Some(c)) => Some(c),
            (None, None) => None,
        }
    }

    /// Clicks with `start_ms <= t < end_ms`, in timestamp order.
    pub fn clicks_between(&self, start_ms: SourceMs, end_ms: SourceMs) -> &[ClickSample] {
        let lo = self.clicks.partition_point(|c| c.time_ms < start_ms);
        let hi = self.clicks.partition_point(|c| c.time_ms < end_ms);
        &self.clicks[lo..hi]
    }
}

/// Parse trace events from JSONL content (one JSON object per line).
/// Lines starting with `#` carry stream metadata and are skipped.
pub fn parse_trace_events(jsonl: &str) -> Result<Vec<TraceEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize trace events to JSONL format.
pub fn serialize_trace_events(events: &[TraceEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}
