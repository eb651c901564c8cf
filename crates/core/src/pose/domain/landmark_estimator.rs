use thiserror::Error;

use super::landmark::LandmarkSet;
use crate::shared::frame::{ChannelOrder, Frame};

#[derive(Error, Debug)]
pub enum EstimationError {
    #[error("landmark inference failed: {0}")]
    Inference(String),
    #[error("unexpected landmark model output: {0}")]
    UnexpectedOutput(String),
}

/// Domain interface for pose-landmark estimation on a single-person crop.
///
/// Returns `Ok(None)` when no body is confidently found; that is an expected
/// outcome, not an error. Coordinates in the returned set are normalized to
/// the crop, origin top-left, y growing downward.
pub trait LandmarkEstimator: Send {
    /// Channel order the estimator expects its input crop in.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn estimate(&mut self, crop: &Frame) -> Result<Option<LandmarkSet>, EstimationError>;
}
