use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnnotateError {
    #[error("IoU threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("malformed box [{xmin}, {ymin}, {xmax}, {ymax}]: min corner must not exceed max corner")]
    InvalidBox {
        xmin: f32,
        ymin: f32,
        xmax: f32,
        ymax: f32,
    },

    #[error("detection score must be in [0, 1], got {0}")]
    InvalidScore(f32),

    #[error("at least one candidate label is required")]
    EmptyLabels,

    #[error("the replay detector needs a recording, pass --detections <FILE>")]
    MissingDetections,
}
