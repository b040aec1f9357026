pub mod annotate;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod source;

pub use annotate::Annotator;
pub use detection::{DetectionOracle, OracleConfig, ReplayOracle, iou, non_max_suppression};
#[cfg(feature = "ocr")]
pub use detection::TextQueryOracle;
pub use error::AnnotateError;
pub use models::{AnnotatedRecord, BoundingBox, Detection, Report};
pub use pipeline::{Pipeline, RejectedImage, RunConfig, RunSummary};
pub use report::ReportWriter;
pub use source::{SourceImage, load_images_from_folder};
