mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from zeroshot_annotate for tests
pub use zeroshot_annotate::{
    AnnotateError, AnnotatedRecord, Annotator, BoundingBox, Detection, DetectionOracle, Pipeline,
    Report, RunConfig, RunSummary,
};
