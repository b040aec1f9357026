//! Detector that replays previously recorded raw detections.
//!
//! The recording is a JSON object keyed by image file name:
//!
//! ```json
//! { "picnic.jpg": [ { "box": { "xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10 },
//!                     "label": "pizza", "score": 0.9 } ] }
//! ```

use anyhow::{Context, Result};
use image::RgbImage;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::{DetectionOracle, OracleConfig};
use crate::models::Detection;

pub struct ReplayOracle {
    recorded: HashMap<String, Vec<Detection>>,
    min_score: f32,
}

impl ReplayOracle {
    /// Load a recording from disk.
    ///
    /// Scores are validated here; box geometry is left as recorded.
    pub fn from_file(path: impl AsRef<Path>, config: &OracleConfig) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read detections file {}", path.display()))?;
        Self::from_json(&raw, config)
            .with_context(|| format!("Invalid detections file {}", path.display()))
    }

    pub fn from_json(raw: &str, config: &OracleConfig) -> Result<Self> {
        let recorded: HashMap<String, Vec<Detection>> = serde_json::from_str(raw)?;
        for (name, detections) in &recorded {
            for detection in detections {
                detection
                    .validate_score()
                    .with_context(|| format!("Recorded detection for {}", name))?;
            }
        }

        Ok(Self {
            recorded,
            min_score: config.min_score,
        })
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

impl DetectionOracle for ReplayOracle {
    fn detect(
        &mut self,
        _image: &RgbImage,
        source_path: &Path,
        candidate_labels: &[String],
    ) -> Result<Vec<Detection>> {
        let Some(name) = source_path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };

        let detections: Vec<Detection> = self
            .recorded
            .get(name)
            .map(|recorded| {
                recorded
                    .iter()
                    .filter(|d| d.score >= self.min_score)
                    .filter(|d| candidate_labels.iter().any(|l| l == &d.label))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!("Replayed {} detections for {}", detections.len(), name);
        Ok(detections)
    }

    fn name(&self) -> &str {
        "Replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const RECORDING: &str = r#"{
        "a.jpg": [
            { "box": { "xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10 }, "label": "pizza", "score": 0.9 },
            { "box": { "xmin": 1, "ymin": 1, "xmax": 9, "ymax": 9 }, "label": "pizza", "score": 0.05 },
            { "box": { "xmin": 2, "ymin": 2, "xmax": 8, "ymax": 8 }, "label": "cake", "score": 0.7 }
        ],
        "b.png": []
    }"#;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replays_by_file_name() -> Result<()> {
        let mut oracle = ReplayOracle::from_json(RECORDING, &OracleConfig::new("models"))?;
        assert_eq!(oracle.len(), 2);

        let image = RgbImage::new(16, 16);
        let path = PathBuf::from("some/dir/a.jpg");
        let found = oracle.detect(&image, &path, &labels(&["pizza", "cake"]))?;

        // 0.05 falls under the default minimum score
        assert_eq!(found.len(), 2);
        Ok(())
    }

    #[test]
    fn test_filters_by_candidate_labels() -> Result<()> {
        let mut oracle = ReplayOracle::from_json(RECORDING, &OracleConfig::new("models"))?;
        let image = RgbImage::new(16, 16);
        let found = oracle.detect(&image, Path::new("a.jpg"), &labels(&["cake"]))?;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "cake");
        Ok(())
    }

    #[test]
    fn test_unknown_image_is_empty() -> Result<()> {
        let config = OracleConfig::new("models").with_min_score(0.0);
        let mut oracle = ReplayOracle::from_json(RECORDING, &config)?;
        let image = RgbImage::new(16, 16);

        assert!(oracle.detect(&image, Path::new("missing.jpg"), &labels(&["pizza"]))?.is_empty());
        assert!(oracle.detect(&image, Path::new("b.png"), &labels(&["pizza"]))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range_score() {
        let raw = r#"{ "a.jpg": [ { "box": { "xmin": 0, "ymin": 0, "xmax": 1, "ymax": 1 }, "label": "x", "score": 1.2 } ] }"#;
        assert!(ReplayOracle::from_json(raw, &OracleConfig::new("models")).is_err());
    }

    #[test]
    fn test_keeps_malformed_boxes_as_recorded() -> Result<()> {
        let raw = r#"{ "a.jpg": [ { "box": { "xmin": 5, "ymin": 0, "xmax": 1, "ymax": 1 }, "label": "x", "score": 0.5 } ] }"#;
        let mut oracle = ReplayOracle::from_json(raw, &OracleConfig::new("models"))?;
        let found = oracle.detect(&RgbImage::new(4, 4), Path::new("a.jpg"), &labels(&["x"]))?;
        assert_eq!(found.len(), 1);
        assert!(found[0].bbox.validate().is_err());
        Ok(())
    }
}
