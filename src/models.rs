use serde::{Deserialize, Serialize};

use crate::error::AnnotateError;

/// Axis-aligned box in pixel coordinates of the source image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    /// Build a box, rejecting inverted or non-finite corners.
    /// Zero-area boxes are accepted.
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Result<Self, AnnotateError> {
        let bbox = Self { xmin, ymin, xmax, ymax };
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> Result<(), AnnotateError> {
        let finite = [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite());

        if !finite || self.xmin > self.xmax || self.ymin > self.ymax {
            return Err(AnnotateError::InvalidBox {
                xmin: self.xmin,
                ymin: self.ymin,
                xmax: self.xmax,
                ymax: self.ymax,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Area shared with `other`, zero when the boxes do not overlap
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let x1 = self.xmin.max(other.xmin);
        let y1 = self.ymin.max(other.ymin);
        let x2 = self.xmax.min(other.xmax);
        let y2 = self.ymax.min(other.ymax);

        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }
}

/// One candidate object returned by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, score: f32) -> Result<Self, AnnotateError> {
        bbox.validate()?;
        let detection = Self {
            bbox,
            label: label.into(),
            score,
        };
        detection.validate_score()?;
        Ok(detection)
    }

    pub fn validate_score(&self) -> Result<(), AnnotateError> {
        if !(0.0..=1.0).contains(&self.score) {
            return Err(AnnotateError::InvalidScore(self.score));
        }
        Ok(())
    }

    /// Caption drawn next to the box, e.g. `pizza: 0.87`
    pub fn caption(&self) -> String {
        format!("{}: {:.2}", self.label, self.score)
    }
}

/// Deduplicated detections for one source image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(rename = "prediction")]
    pub detections: Vec<Detection>,
    #[serde(rename = "img_path")]
    pub source_path: String,
}

/// Every record produced by one run, in processing order
pub type Report = Vec<AnnotatedRecord>;
