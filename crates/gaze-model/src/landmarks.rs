//! Per-frame landmark sets from the external face detector.
//!
//! The detector is a black box that emits an ordered landmark set with
//! stable point indexing across frames. Coordinates are in frame pixels.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// One frame's worth of facial landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Ordered landmark positions in frame pixels. Indexing is stable
    /// across frames for the lifetime of a session.
    pub points: Vec<Point2D>,

    /// Source frame width in pixels.
    pub frame_width: u32,

    /// Source frame height in pixels.
    pub frame_height: u32,

    /// Detector-reported confidence in `[0.0, 1.0]`.
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

/// Bounding box of a landmark set, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkBox {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point2D>, frame_width: u32, frame_height: u32) -> Self {
        Self {
            points,
            frame_width,
            frame_height,
            confidence: 1.0,
        }
    }

    /// Attach the detector's confidence for this frame.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Whether the detector found anything this frame.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounding box of all landmarks.
    ///
    /// Returns `None` for an empty landmark set.
    pub fn bounding_box(&self) -> Option<LandmarkBox> {
        if self.points.is_empty() {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(LandmarkBox {
            min_x,
            min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}

impl LandmarkBox {
    /// Top-left corner, the head origin used for displacement tracking.
    pub fn origin(&self) -> Point2D {
        Point2D::new(self.min_x, self.min_y)
    }
}
