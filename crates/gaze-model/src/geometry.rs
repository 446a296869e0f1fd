//! Geometry types for gaze coordinates and screen regions.
//!
//! Gaze points and areas of interest live in screen pixels; calibration
//! targets are normalized to `[0.0, 1.0]` and mapped to pixels against
//! the viewport at display time.

use serde::{Deserialize, Serialize};

/// A 2D point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// An axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    /// Create a new rectangle, clamping dimensions to be non-negative.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// The center point of this rectangle.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Check if a point is within this rectangle (edges inclusive).
    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// A screen region tracked for dwell and refixation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    /// Caller-chosen identifier, unique within a session.
    pub id: String,

    /// The region in screen pixels.
    pub rect: Rect,
}

impl AreaOfInterest {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self { id: id.into(), rect }
    }
}

/// A calibration target, normalized to `[0.0, 1.0]` in both axes.
///
/// `(0.0, 0.0)` is the top-left of the viewport, `(1.0, 1.0)` the
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub x: f64,
    pub y: f64,
}

impl TargetPoint {
    /// Create a target, clamping into the normalized range.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    /// Map this target to pixel coordinates for the given viewport.
    pub fn to_pixels(&self, viewport_width: u32, viewport_height: u32) -> Point2D {
        Point2D::new(
            self.x * viewport_width as f64,
            self.y * viewport_height as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_lerp() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(10.0, 20.0);
        let mid = Point2D::lerp(&a, &b, 0.5);
        assert!((mid.x - 5.0).abs() < 1e-9);
        assert!((mid.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect.contains(&Point2D::new(50.0, 50.0)));
        assert!(rect.contains(&Point2D::new(0.0, 0.0)));
        assert!(rect.contains(&Point2D::new(100.0, 100.0)));
        assert!(!rect.contains(&Point2D::new(100.1, 50.0)));
        assert!(!rect.contains(&Point2D::new(-1.0, 50.0)));
    }

    #[test]
    fn test_rect_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        let center = rect.center();
        assert!((center.x - 60.0).abs() < 1e-9);
        assert!((center.y - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_clamps() {
        let target = TargetPoint::new(1.5, -0.2);
        assert_eq!(target.x, 1.0);
        assert_eq!(target.y, 0.0);
    }

    #[test]
    fn test_target_to_pixels() {
        let target = TargetPoint::new(0.5, 0.25);
        let px = target.to_pixels(1920, 1080);
        assert!((px.x - 960.0).abs() < 1e-9);
        assert!((px.y - 270.0).abs() < 1e-9);
    }
}
