//! Validate a recorded gaze stream.

use std::path::PathBuf;

use gazekit_gaze_model::{parse_header, parse_points};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating gaze stream: {}", path.display());

    let content = std::fs::read_to_string(&path)
        .map_err(|_| anyhow::anyhow!("Gaze stream not found: {}", path.display()))?;

    let mut errors: Vec<String> = Vec::new();

    match parse_header(&content) {
        Some(Ok(header)) => {
            println!("  Schema: {}", header.schema_version);
            println!("  Recorded: {}", header.epoch_wall);
            println!(
                "  Screen: {}x{} @ {}Hz",
                header.screen_width, header.screen_height, header.frame_rate_hz
            );
        }
        Some(Err(e)) => errors.push(format!("Header does not parse: {e}")),
        None => errors.push("Missing header line".to_string()),
    }

    match parse_points(&content) {
        Ok(points) => {
            println!("  Gaze points: {}", points.len());

            let mut previous = None;
            for (index, point) in points.iter().enumerate() {
                if let Some(prev) = previous {
                    if point.timestamp_ns < prev {
                        errors.push(format!(
                            "Timestamp order violated at point {index}: {} < {prev}",
                            point.timestamp_ns
                        ));
                        break;
                    }
                }
                if !point.x.is_finite() || !point.y.is_finite() {
                    errors.push(format!("Non-finite coordinates at point {index}"));
                    break;
                }
                previous = Some(point.timestamp_ns);
            }
        }
        Err(e) => errors.push(format!("Points do not parse: {e}")),
    }

    if errors.is_empty() {
        println!("\nStream is valid.");
        Ok(())
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        anyhow::bail!("{} issue(s) found", errors.len());
    }
}
