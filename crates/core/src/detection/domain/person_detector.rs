use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("person detection inference failed: {0}")]
    Inference(String),
    #[error("unexpected detector output: {0}")]
    UnexpectedOutput(String),
}

/// Domain interface for person detection on a full frame.
///
/// Implementations return only person boxes, in descending confidence
/// order, and surface model failures instead of returning an empty list.
pub trait PersonDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError>;
}
