use anyhow::Result;
use image::RgbImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::Path;
use tracing::{debug, trace};

use super::{DetectionOracle, OracleConfig};
use crate::models::{BoundingBox, Detection};

pub const DETECTION_MODEL: &str = "text-detection.rten";
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Zero-shot detector for text queries.
///
/// Reads every text line in the image and reports the lines that contain
/// a candidate label. The score is the share of the line taken up by the
/// label, so an exact line match scores 1.0.
pub struct TextQueryOracle {
    engine: OcrEngine,
    min_score: f32,
}

impl TextQueryOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let detection_model_path = config.model_dir.join(DETECTION_MODEL);
        let recognition_model_path = config.model_dir.join(RECOGNITION_MODEL);

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self {
            engine,
            min_score: config.min_score,
        })
    }
}

impl DetectionOracle for TextQueryOracle {
    fn detect(
        &mut self,
        image: &RgbImage,
        source_path: &Path,
        candidate_labels: &[String],
    ) -> Result<Vec<Detection>> {
        let img_source = ImageSource::from_bytes(image.as_raw(), image.dimensions())
            .map_err(|_| anyhow::anyhow!("Unsupported image layout: {}", source_path.display()))?;
        let ocr_input = self.engine.prepare_input(img_source)?;

        let word_rects = self.engine.detect_words(&ocr_input)?;
        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);
        let lines = self.engine.recognize_text(&ocr_input, &line_rects)?;

        let mut detections = Vec::new();
        for line in lines.iter().flatten() {
            let text = line.to_string();
            trace!("Recognized line: '{}'", text);

            let rect = line.bounding_rect();
            let bbox = BoundingBox::new(
                rect.left().max(0) as f32,
                rect.top().max(0) as f32,
                rect.right().max(0) as f32,
                rect.bottom().max(0) as f32,
            )?;

            for label in candidate_labels {
                if let Some(score) = match_score(&text, label)
                    && score >= self.min_score
                {
                    detections.push(Detection::new(bbox, label.clone(), score)?);
                }
            }
        }

        debug!(
            "{} text lines, {} matched a label in {}",
            lines.iter().flatten().count(),
            detections.len(),
            source_path.display()
        );
        Ok(detections)
    }

    fn name(&self) -> &str {
        "Text Query (OCR)"
    }
}

/// Case-insensitive containment score of `label` inside `text`.
///
/// `None` when the label does not occur; otherwise the label's share of the
/// line's non-blank characters, capped at 1.
pub fn match_score(text: &str, label: &str) -> Option<f32> {
    let text = text.trim().to_lowercase();
    let label = label.trim().to_lowercase();
    if label.is_empty() || !text.contains(&label) {
        return None;
    }

    let text_len = text.chars().filter(|c| !c.is_whitespace()).count();
    let label_len = label.chars().filter(|c| !c.is_whitespace()).count();
    if text_len == 0 {
        return None;
    }

    Some((label_len as f32 / text_len as f32).min(1.0))
}
