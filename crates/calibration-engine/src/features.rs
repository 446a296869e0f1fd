//! Landmark-to-feature extraction with head compensation.
//!
//! Encodes one frame's eye geometry as a fixed-length feature vector.
//! Eye keypoints are normalized against the face bounding box and scaled
//! by the ratio between the current and reference box sizes, which
//! compensates for head distance and movement. The reference box is
//! captured once at session start.
//!
//! # Feature layout
//!
//! For K designated keypoints per eye:
//! - `4K` values: compensated x/y for each left-eye then right-eye keypoint
//! - 6 scalars: x scale, y scale, box width, box height, head-origin
//!   displacement x, displacement y

use gazekit_gaze_model::{FeatureVector, LandmarkFrame, Point2D};

/// Frame-skip conditions for feature extraction.
///
/// Neither is an error: the caller drops the frame and keeps the last
/// known gaze state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameSkip {
    /// The detector produced no landmarks this frame.
    #[error("no landmarks detected this frame")]
    NoDetection,

    /// The reference head box has not been captured yet.
    #[error("reference head box not yet captured")]
    UndefinedReferenceScale,
}

/// Configuration for the feature extractor.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Landmark indices of the designated left-eye keypoints.
    pub left_eye_indices: Vec<usize>,

    /// Landmark indices of the designated right-eye keypoints.
    /// Must have the same length as `left_eye_indices`.
    pub right_eye_indices: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        // MediaPipe FaceMesh eye-contour subset: corners plus upper and
        // lower lid points, six per eye.
        Self {
            left_eye_indices: vec![33, 133, 159, 145, 153, 144],
            right_eye_indices: vec![362, 263, 386, 374, 380, 373],
        }
    }
}

impl FeatureConfig {
    /// Keypoints tracked per eye.
    pub fn keypoints_per_eye(&self) -> usize {
        self.left_eye_indices.len()
    }

    /// Total feature-vector length this configuration produces.
    pub fn feature_len(&self) -> usize {
        4 * self.keypoints_per_eye() + 6
    }
}

/// Reference geometry captured once at session start.
#[derive(Debug, Clone, Copy)]
struct ReferenceScale {
    box_width: f64,
    box_height: f64,
    origin: Point2D,
}

/// Maps a raw landmark frame into a fixed-dimension feature vector.
pub struct FeatureExtractor {
    config: FeatureConfig,
    reference: Option<ReferenceScale>,
}

impl FeatureExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// Create an extractor with the default keypoint set.
    pub fn with_defaults() -> Self {
        Self::new(FeatureConfig::default())
    }

    /// The fixed feature-vector length this extractor produces.
    pub fn feature_len(&self) -> usize {
        self.config.feature_len()
    }

    /// Whether the reference geometry has been captured.
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Capture the reference bounding box and head origin from a frame.
    ///
    /// Called once at session start; a later call replaces the reference
    /// (used by session reset).
    pub fn capture_reference(&mut self, frame: &LandmarkFrame) -> Result<(), FrameSkip> {
        let bbox = frame.bounding_box().ok_or(FrameSkip::NoDetection)?;
        if bbox.width <= f64::EPSILON || bbox.height <= f64::EPSILON {
            return Err(FrameSkip::NoDetection);
        }

        self.reference = Some(ReferenceScale {
            box_width: bbox.width,
            box_height: bbox.height,
            origin: bbox.origin(),
        });
        tracing::debug!(
            width = bbox.width,
            height = bbox.height,
            "Reference head box captured"
        );
        Ok(())
    }

    /// Drop the captured reference (session reset).
    pub fn clear_reference(&mut self) {
        self.reference = None;
    }

    /// Extract the feature vector for a frame.
    ///
    /// Skips the frame when the landmark set is empty or the reference
    /// has not been captured yet.
    pub fn extract(&self, frame: &LandmarkFrame) -> Result<FeatureVector, FrameSkip> {
        let bbox = frame.bounding_box().ok_or(FrameSkip::NoDetection)?;
        if bbox.width <= f64::EPSILON || bbox.height <= f64::EPSILON {
            return Err(FrameSkip::NoDetection);
        }
        let reference = self.reference.ok_or(FrameSkip::UndefinedReferenceScale)?;

        let scale_x = bbox.width / reference.box_width;
        let scale_y = bbox.height / reference.box_height;
        let origin = bbox.origin();

        let mut values = Vec::with_capacity(self.feature_len());

        for &index in self
            .config
            .left_eye_indices
            .iter()
            .chain(self.config.right_eye_indices.iter())
        {
            let Some(point) = frame.points.get(index) else {
                // The detector emitted fewer points than the configured
                // topology expects; treat as a detection failure.
                return Err(FrameSkip::NoDetection);
            };

            let norm_x = (point.x - origin.x) / bbox.width;
            let norm_y = (point.y - origin.y) / bbox.height;
            values.push(norm_x * scale_x);
            values.push(norm_y * scale_y);
        }

        values.push(scale_x);
        values.push(scale_y);
        values.push(bbox.width);
        values.push(bbox.height);
        values.push(origin.x - reference.origin.x);
        values.push(origin.y - reference.origin.y);

        Ok(FeatureVector::new(values))
    }
}
