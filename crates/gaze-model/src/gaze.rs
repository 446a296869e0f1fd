//! Predicted gaze points and the recorded-stream format.
//!
//! Gaze streams are recorded in append-only JSONL format: a `# `-prefixed
//! header line followed by one JSON object per sample. Coordinates are
//! in screen pixels; timestamps are monotonic nanoseconds since session
//! start.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// A single predicted gaze point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    /// Monotonic nanoseconds since session start.
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    /// Screen X coordinate in pixels.
    pub x: f64,

    /// Screen Y coordinate in pixels.
    pub y: f64,

    /// Prediction confidence in `[0.0, 1.0]`.
    pub confidence: f32,
}

impl GazePoint {
    pub fn new(timestamp_ns: TimestampNs, x: f64, y: f64, confidence: f32) -> Self {
        Self {
            timestamp_ns,
            x,
            y,
            confidence,
        }
    }

    /// Timestamp as fractional seconds since session start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }

    /// The screen position as a point.
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Header metadata for a recorded gaze stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazeStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at session start (ISO 8601).
    pub epoch_wall: String,

    /// Screen dimensions in pixels at recording time.
    pub screen_width: u32,
    pub screen_height: u32,

    /// Nominal frame rate of the landmark source (Hz).
    pub frame_rate_hz: u32,
}

/// Parse gaze points from JSONL content (one JSON object per line).
pub fn parse_points(jsonl: &str) -> Result<Vec<GazePoint>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Parse the `# `-prefixed header line of a recorded stream.
pub fn parse_header(jsonl: &str) -> Option<Result<GazeStreamHeader, serde_json::Error>> {
    jsonl
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| serde_json::from_str(line.trim_start_matches('#').trim()))
}

/// Serialize a gaze stream to JSONL format with a header line.
pub fn serialize_stream(
    header: &GazeStreamHeader,
    points: &[GazePoint],
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    output.push_str("# ");
    output.push_str(&serde_json::to_string(header)?);
    output.push('\n');
    for point in points {
        output.push_str(&serde_json::to_string(point)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> GazeStreamHeader {
        GazeStreamHeader {
            schema_version: "1.0".to_string(),
            epoch_wall: "2026-01-01T00:00:00Z".to_string(),
            screen_width: 1920,
            screen_height: 1080,
            frame_rate_hz: 30,
        }
    }

    #[test]
    fn test_point_roundtrip() {
        let point = GazePoint::new(1_000_000_000, 960.0, 540.0, 0.9);
        let json = serde_json::to_string(&point).unwrap();
        let parsed: GazePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, parsed);
    }

    #[test]
    fn test_json_field_names() {
        let point = GazePoint::new(1234567890123, 10.5, 20.25, 1.0);
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"t\":1234567890123"));
        assert!(json.contains("\"x\":10.5"));
        assert!(json.contains("\"y\":20.25"));
    }

    #[test]
    fn test_stream_roundtrip() {
        let points = vec![
            GazePoint::new(0, 100.0, 100.0, 0.8),
            GazePoint::new(33_000_000, 105.0, 98.0, 0.85),
            GazePoint::new(66_000_000, 500.0, 500.0, 0.9),
        ];
        let jsonl = serialize_stream(&make_header(), &points).unwrap();

        let header = parse_header(&jsonl).unwrap().unwrap();
        assert_eq!(header.screen_width, 1920);

        let parsed = parse_points(&jsonl).unwrap();
        assert_eq!(points, parsed);
    }

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"epoch_wall\":\"2026-01-01T00:00:00Z\",\"screen_width\":800,\"screen_height\":600,\"frame_rate_hz\":30}\n\n{\"t\":0,\"x\":1.0,\"y\":2.0,\"confidence\":0.5}\n";
        let parsed = parse_points(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].timestamp_ns, 0);
    }

    #[test]
    fn test_timestamp_secs() {
        let point = GazePoint::new(1_500_000_000, 0.0, 0.0, 1.0);
        assert!((point.timestamp_secs() - 1.5).abs() < 1e-9);
    }
}
