//! gazekit Session Engine
//!
//! Ties the calibration and analytics engines into one owned session:
//! reference capture, the calibration target walk, background refits,
//! filtered per-frame prediction, and event segmentation. Every
//! component instance belongs to exactly one session; a new session
//! starts from a full reset, never from another session's buffers.

pub mod session;

pub use session::{SessionConfig, SessionState, TrackingSession};
