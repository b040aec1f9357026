pub mod nms;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod replay;

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::models::Detection;

pub use nms::{iou, non_max_suppression};
#[cfg(feature = "ocr")]
pub use ocr::TextQueryOracle;
pub use replay::ReplayOracle;

/// Zero-shot detector: one image plus free-text labels in, raw detections out.
///
/// Called once per image. The returned set is unordered and may contain
/// overlapping boxes for the same object.
pub trait DetectionOracle {
    fn detect(
        &mut self,
        image: &RgbImage,
        source_path: &Path,
        candidate_labels: &[String],
    ) -> anyhow::Result<Vec<Detection>>;

    /// Human-readable name for this detector (used in log output)
    fn name(&self) -> &str;
}

/// Settings fixed before a run and handed to the oracle's constructor
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Directory holding model files for model-backed oracles
    pub model_dir: PathBuf,
    /// Raw detections scoring below this are dropped by the oracle
    pub min_score: f32,
}

impl OracleConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            min_score: 0.1,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// `$HOME/.cache/ocrs`, falling back to `.cache/ocrs` in the working directory
    pub fn default_model_dir() -> PathBuf {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map(|home| Path::new(&home).join(".cache/ocrs"))
            .unwrap_or_else(|_| PathBuf::from(".cache/ocrs"))
    }
}
