//! Recordings and the recording lookup service.
//!
//! A `RecordingStore` is an explicitly constructed, lifetime-scoped service
//! injected into the evaluators — recording lookups never go through
//! process-wide singletons.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::EventTrace;

/// One captured screen recording and its input trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,

    /// Capture dimensions in physical pixels.
    pub width: u32,
    pub height: u32,

    /// Captured duration in milliseconds.
    pub duration_ms: f64,

    /// Recorded input events on this recording's source-time axis.
    pub trace: EventTrace,
}

impl Recording {
    pub fn new(id: impl Into<String>, width: u32, height: u32, duration_ms: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            duration_ms,
            trace: EventTrace {
                capture_width: width,
                capture_height: height,
                ..Default::default()
            },
        }
    }

    pub fn with_trace(mut self, trace: EventTrace) -> Self {
        self.trace = trace;
        self
    }
}

/// In-memory recording lookup keyed by id.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    recordings: HashMap<String, Recording>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, recording: Recording) {
        self.recordings.insert(recording.id.clone(), recording);
    }

    pub fn get(&self, id: &str) -> Option<&Recording> {
        self.recordings.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recordings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

impl FromIterator<Recording> for RecordingStore {
    fn from_iter<T: IntoIterator<Item = Recording>>(iter: T) -> Self {
        let mut store = Self::new();
        for recording in iter {
            store.insert(recording);
        }
        store
    }
}
