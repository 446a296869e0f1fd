//! gazekit Analytics Engine
//!
//! Segments a temporally-ordered stream of predicted gaze points into
//! behavioral events and aggregate statistics:
//! - **Fixations:** sustained gaze within a spatial radius
//! - **Saccades:** rapid jumps between consecutive samples
//! - **Dwell time:** continuous residence inside one area of interest
//! - **Refixations:** repeat visits to already-visited areas
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod segmenter;

pub use segmenter::{GazeEventSegmenter, SegmenterConfig};
