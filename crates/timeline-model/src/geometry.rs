//! Normalized 2D geometry shared by the calculators.
//!
//! All camera and cursor positions are normalized: `(0.0, 0.0)` is the
//! top-left of the capture region, `(1.0, 1.0)` the bottom-right.

use serde::{Deserialize, Serialize};

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

impl NormPoint {
    /// Screen center, the camera's resting target.
    pub const CENTER: NormPoint = NormPoint { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both components into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &NormPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &NormPoint, b: &NormPoint, t: f64) -> NormPoint {
        let t = t.clamp(0.0, 1.0);
        NormPoint {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    /// Whether both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
