use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::annotate::Annotator;
use crate::detection::{DetectionOracle, non_max_suppression, nms};
use crate::error::AnnotateError;
use crate::models::AnnotatedRecord;
use crate::report::{DEFAULT_REPORT_NAME, ReportWriter};
use crate::source::{SourceImage, load_images_from_folder};

/// IoU threshold used by the original annotation runs
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.2;

/// Settings for one annotation run, fixed before the first image is read
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_folder: PathBuf,
    pub candidate_labels: Vec<String>,
    pub output_folder: PathBuf,
    pub iou_threshold: f32,
    pub report_name: String,
}

impl RunConfig {
    pub fn new(
        input_folder: impl Into<PathBuf>,
        candidate_labels: Vec<String>,
        output_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_folder: input_folder.into(),
            candidate_labels,
            output_folder: output_folder.into(),
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_report_name(mut self, report_name: impl Into<String>) -> Self {
        self.report_name = report_name.into();
        self
    }

    pub fn validate(&self) -> Result<(), AnnotateError> {
        nms::validate_threshold(self.iou_threshold)?;
        if self.candidate_labels.is_empty() {
            return Err(AnnotateError::EmptyLabels);
        }
        Ok(())
    }
}

/// An image dropped because its detections could not be processed
#[derive(Debug)]
pub struct RejectedImage {
    pub path: PathBuf,
    pub reason: AnnotateError,
}

/// What a finished run produced
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Images decoded from the input folder
    pub loaded: usize,
    /// Images written to the output folder and recorded in the report
    pub annotated: usize,
    /// Images for which the detector found nothing
    pub without_detections: usize,
    pub rejected: Vec<RejectedImage>,
    pub report_path: PathBuf,
}

enum ImageOutcome {
    Annotated(AnnotatedRecord),
    NoDetections,
    Rejected(AnnotateError),
}

/// Load, detect, deduplicate, annotate, report.
///
/// Images are handled one at a time in directory order; the report is
/// written once after the last image.
pub struct Pipeline {
    config: RunConfig,
    oracle: Box<dyn DetectionOracle>,
    annotator: Annotator,
}

impl Pipeline {
    /// Validate `config` and make sure the output folder exists
    pub fn new(config: RunConfig, oracle: Box<dyn DetectionOracle>) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.output_folder).with_context(|| {
            format!("Failed to create output folder {}", config.output_folder.display())
        })?;

        Ok(Self {
            config,
            oracle,
            annotator: Annotator::default(),
        })
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        // Everything is held in memory for the whole run
        let images = load_images_from_folder(&self.config.input_folder)?;
        let total = images.len();
        info!(
            "Annotating {} images with {} for {:?}",
            total,
            self.oracle.name(),
            self.config.candidate_labels
        );

        let mut report = ReportWriter::new();
        let mut summary = RunSummary {
            loaded: total,
            ..Default::default()
        };

        for (idx, source) in images.iter().enumerate() {
            info!("[{}/{}] {}", idx + 1, total, source.path.display());

            match self.process_image(source)? {
                ImageOutcome::Annotated(record) => {
                    report.push(record);
                    summary.annotated += 1;
                }
                ImageOutcome::NoDetections => {
                    debug!("No detections, skipping {}", source.path.display());
                    summary.without_detections += 1;
                }
                ImageOutcome::Rejected(reason) => {
                    error!("Rejected {}: {}", source.path.display(), reason);
                    summary.rejected.push(RejectedImage {
                        path: source.path.clone(),
                        reason,
                    });
                }
            }
        }

        summary.report_path = report.finish(&self.config.output_folder, &self.config.report_name)?;
        info!(
            "Annotated {} of {} images ({} without detections, {} rejected), report: {}",
            summary.annotated,
            summary.loaded,
            summary.without_detections,
            summary.rejected.len(),
            summary.report_path.display()
        );

        Ok(summary)
    }

    fn process_image(&mut self, source: &SourceImage) -> Result<ImageOutcome> {
        let raw = self
            .oracle
            .detect(&source.image, &source.path, &self.config.candidate_labels)
            .with_context(|| format!("Detector failed on {}", source.path.display()))?;

        if raw.is_empty() {
            return Ok(ImageOutcome::NoDetections);
        }

        let raw_count = raw.len();
        let detections = match non_max_suppression(raw, self.config.iou_threshold) {
            Ok(detections) => detections,
            Err(reason @ AnnotateError::InvalidBox { .. }) => {
                return Ok(ImageOutcome::Rejected(reason));
            }
            Err(e) => return Err(e.into()),
        };
        debug!("{} detections, {} after NMS", raw_count, detections.len());

        let output_path = self.output_path_for(&source.path)?;
        self.annotator
            .render_to(&source.image, &detections, &output_path)?;

        Ok(ImageOutcome::Annotated(AnnotatedRecord {
            detections,
            source_path: source.path.display().to_string(),
        }))
    }

    /// `output_folder/<source base name>`
    pub fn output_path_for(&self, source_path: &Path) -> Result<PathBuf> {
        let name = source_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Source path has no file name: {}", source_path.display()))?;
        Ok(self.config.output_folder.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["pizza".to_string()]
    }

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::new("imgs", labels(), "annotated");
        assert_eq!(config.iou_threshold, DEFAULT_IOU_THRESHOLD);
        assert_eq!(config.report_name, "annotated.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_threshold() {
        let config = RunConfig::new("imgs", labels(), "annotated").with_iou_threshold(0.0);
        assert_eq!(config.validate(), Err(AnnotateError::InvalidThreshold(0.0)));

        let config = RunConfig::new("imgs", labels(), "annotated").with_iou_threshold(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_empty_labels() {
        let config = RunConfig::new("imgs", Vec::new(), "annotated");
        assert_eq!(config.validate(), Err(AnnotateError::EmptyLabels));
    }
}
