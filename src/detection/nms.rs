//! Non-maximum suppression over one image's raw detections.

use crate::error::AnnotateError;
use crate::models::{BoundingBox, Detection};

/// Intersection over union of two boxes.
///
/// Areas are accumulated in f64 so boxes anywhere in the f32 range stay
/// finite. Returns 0 when the union is empty (both boxes degenerate), so
/// callers never divide by zero.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let area = |b: &BoundingBox| {
        (b.xmax as f64 - b.xmin as f64) * (b.ymax as f64 - b.ymin as f64)
    };

    let dx = a.xmax.min(b.xmax) as f64 - a.xmin.max(b.xmin) as f64;
    let dy = a.ymax.min(b.ymax) as f64 - a.ymin.max(b.ymin) as f64;
    let intersection = dx.max(0.0) * dy.max(0.0);
    let union = area(a) + area(b) - intersection;

    if !(union > 0.0) || !union.is_finite() {
        return 0.0;
    }
    (intersection / union).clamp(0.0, 1.0) as f32
}

/// Check that a threshold lies in (0, 1]
pub fn validate_threshold(iou_threshold: f32) -> Result<(), AnnotateError> {
    if iou_threshold > 0.0 && iou_threshold <= 1.0 {
        Ok(())
    } else {
        Err(AnnotateError::InvalidThreshold(iou_threshold))
    }
}

/// Drop detections that overlap a higher-scoring one by at least `iou_threshold`.
///
/// Detections are ordered by descending score; ties keep their input order.
/// Every pair is compared, and the later member of an overlapping pair is
/// suppressed even if the earlier member was itself suppressed. Suppression
/// is label-agnostic. Survivors are returned in descending-score order.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
) -> Result<Vec<Detection>, AnnotateError> {
    validate_threshold(iou_threshold)?;
    for detection in &detections {
        detection.bbox.validate()?;
    }

    // stable sort
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep = vec![true; detections.len()];
    for i in 0..detections.len() {
        for j in (i + 1)..detections.len() {
            if !keep[j] {
                continue;
            }
            if iou(&detections[i].bbox, &detections[j].bbox) >= iou_threshold {
                keep[j] = false;
            }
        }
    }

    Ok(detections
        .into_iter()
        .zip(keep)
        .filter_map(|(detection, kept)| kept.then_some(detection))
        .collect())
}
