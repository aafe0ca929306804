use serde::{Deserialize, Serialize};

use crate::detection::domain::label::Label;
use crate::detection::domain::raw_detection::RawDetection;
use crate::shared::bounding_box::BoundingBox;

/// A reported face: verdict, score and integer box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: Label,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Turns raw model output into the public detection list.
///
/// Boxes scoring strictly below the threshold are dropped; everything else
/// keeps the model's emission order.
#[derive(Clone, Copy, Debug)]
pub struct ResultFormatter {
    default_threshold: f32,
}

impl ResultFormatter {
    pub fn new(default_threshold: f32) -> Self {
        Self { default_threshold }
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }

    /// Formats `raw` against `threshold`, or the configured default when
    /// the caller gives none.
    pub fn format(&self, raw: &[RawDetection], threshold: Option<f32>) -> Vec<Detection> {
        let threshold = threshold.unwrap_or(self.default_threshold);
        if raw.is_empty() {
            log::debug!("No boxes in model output");
            return Vec::new();
        }

        log::debug!(
            "Filtering {} boxes (confidence threshold: {threshold})",
            raw.len()
        );
        raw.iter()
            .filter(|det| {
                let keep = det.confidence >= threshold;
                if !keep {
                    log::debug!(
                        "Box dropped: class={} confidence {:.3} < {threshold}",
                        det.class_id,
                        det.confidence
                    );
                }
                keep
            })
            .map(format_one)
            .collect()
    }
}

fn format_one(det: &RawDetection) -> Detection {
    Detection {
        label: Label::from_class_id(det.class_id),
        confidence: det.confidence,
        bbox: BoundingBox::from_corners(det.x1, det.y1, det.x2, det.y2),
    }
}
