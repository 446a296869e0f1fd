//! Segment a recorded gaze stream and report eye metrics.

use std::path::PathBuf;

use gazekit_analytics_engine::{GazeEventSegmenter, SegmenterConfig};
use gazekit_gaze_model::{parse_header, parse_points, Rect};

pub fn run(
    path: PathBuf,
    fixation_radius: f64,
    fixation_min_ms: f64,
    saccade_distance: f64,
    saccade_max_ms: f64,
    aois: Vec<String>,
) -> anyhow::Result<()> {
    println!("Analyzing gaze stream: {}", path.display());

    let content = std::fs::read_to_string(&path)
        .map_err(|_| anyhow::anyhow!("Gaze stream not found: {}", path.display()))?;

    if let Some(header) = parse_header(&content) {
        let header = header.map_err(|e| anyhow::anyhow!("Failed to parse stream header: {e}"))?;
        println!(
            "  Screen: {}x{} @ {}Hz",
            header.screen_width, header.screen_height, header.frame_rate_hz
        );
    }

    let points =
        parse_points(&content).map_err(|e| anyhow::anyhow!("Failed to parse gaze points: {e}"))?;
    println!("  Loaded {} gaze points", points.len());

    if points.is_empty() {
        println!("  No points to analyze.");
        return Ok(());
    }

    let mut segmenter = GazeEventSegmenter::new(SegmenterConfig {
        fixation_radius_px: fixation_radius,
        fixation_min_duration_ms: fixation_min_ms,
        saccade_min_distance_px: saccade_distance,
        saccade_max_duration_ms: saccade_max_ms,
    });

    for spec in &aois {
        let (id, rect) = parse_aoi_spec(spec)?;
        println!("  AOI {id}: {:.0},{:.0} {:.0}x{:.0}", rect.x, rect.y, rect.w, rect.h);
        segmenter.add_aoi(id, rect);
    }

    for point in points {
        segmenter.observe(point);
    }

    let metrics = segmenter.metrics();
    println!("\n{}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}

/// Parse an AOI argument of the form `id:x,y,w,h`.
fn parse_aoi_spec(spec: &str) -> anyhow::Result<(String, Rect)> {
    let (id, rest) = spec
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Invalid AOI spec (expected id:x,y,w,h): {spec}"))?;

    let values: Vec<f64> = rest
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| anyhow::anyhow!("Invalid AOI rectangle in: {spec}"))?;

    if values.len() != 4 {
        anyhow::bail!("AOI rectangle needs exactly x,y,w,h: {spec}");
    }

    Ok((
        id.to_string(),
        Rect::new(values[0], values[1], values[2], values[3]),
    ))
}
