/// BlazePose-style landmark estimator using ONNX Runtime via `ort`.
///
/// Expects a single-person crop. Handles letterbox preprocessing, inference,
/// the pose-presence gate, and conversion of the 33 landmarks from model
/// input pixels back to crop-normalized coordinates.
use std::path::Path;

use crate::pose::domain::landmark::{Landmark, LandmarkName, LandmarkSet};
use crate::pose::domain::landmark_estimator::{EstimationError, LandmarkEstimator};
use crate::shared::frame::{ChannelOrder, Frame};
use crate::shared::letterbox::{letterbox, Letterbox, TensorLayout};
use crate::shared::onnx_session::{load_session, square_input_size};

/// Fallback input resolution for the full BlazePose landmark model.
const DEFAULT_INPUT_SIZE: u32 = 256;

/// Default minimum pose-presence score for a crop to count as a body.
pub const DEFAULT_PRESENCE_THRESHOLD: f64 = 0.5;

/// Values per landmark in the raw output: x, y, z, visibility, presence.
const VALUES_PER_LANDMARK: usize = 5;

pub struct OnnxPoseLandmarker {
    session: ort::session::Session,
    presence_threshold: f64,
    input_size: u32,
}

impl OnnxPoseLandmarker {
    /// Load a landmark ONNX model (NHWC input).
    ///
    /// The input resolution is read from the model; falls back to 256.
    pub fn new(
        model_path: &Path,
        presence_threshold: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = square_input_size(&session, true).unwrap_or(DEFAULT_INPUT_SIZE);
        log::info!(
            "Pose landmark model loaded ({input_size}x{input_size}) from {}",
            model_path.display()
        );
        Ok(Self {
            session,
            presence_threshold,
            input_size,
        })
    }
}

impl LandmarkEstimator for OnnxPoseLandmarker {
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn estimate(&mut self, crop: &Frame) -> Result<Option<LandmarkSet>, EstimationError> {
        if crop.is_empty() {
            return Ok(None);
        }

        let (input, lb) = letterbox(crop, self.input_size, TensorLayout::Nhwc, 0.0);
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| EstimationError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| EstimationError::Inference(e.to_string()))?;
        if outputs.len() < 2 {
            return Err(EstimationError::UnexpectedOutput(format!(
                "expected landmarks and presence outputs, got {}",
                outputs.len()
            )));
        }

        let raw = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| EstimationError::UnexpectedOutput(e.to_string()))?;
        let flag = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| EstimationError::UnexpectedOutput(e.to_string()))?;

        let presence = flag.iter().next().copied().unwrap_or(0.0) as f64;
        if presence < self.presence_threshold {
            log::debug!("No body in crop (presence {presence:.2})");
            return Ok(None);
        }

        let values: Vec<f32> = raw.iter().copied().collect();
        decode_landmarks(&values, &lb, crop.width(), crop.height()).map(Some)
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Converts raw model values into a crop-normalized landmark set.
///
/// `raw` holds at least 33 records of `[x, y, z, visibility_logit, presence]`
/// in model input pixels; extra auxiliary records are ignored.
fn decode_landmarks(
    raw: &[f32],
    lb: &Letterbox,
    crop_w: u32,
    crop_h: u32,
) -> Result<LandmarkSet, EstimationError> {
    let needed = LandmarkName::COUNT * VALUES_PER_LANDMARK;
    if raw.len() < needed {
        return Err(EstimationError::UnexpectedOutput(format!(
            "expected at least {needed} landmark values, got {}",
            raw.len()
        )));
    }

    let cw = crop_w as f64;
    let ch = crop_h as f64;
    let set = LandmarkName::ALL
        .iter()
        .enumerate()
        .map(|(i, &name)| {
            let rec = &raw[i * VALUES_PER_LANDMARK..(i + 1) * VALUES_PER_LANDMARK];
            let (px, py) = lb.unmap(rec[0] as f64, rec[1] as f64);
            let landmark = Landmark {
                x: px / cw,
                y: py / ch,
                // Depth uses the same scale as x
                z: rec[2] as f64 / lb.scale / cw,
                visibility: sigmoid(rec[3] as f64),
            };
            (name, landmark)
        })
        .collect();
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw_with(index: usize, rec: [f32; 5]) -> Vec<f32> {
        let mut raw = vec![0.0f32; 39 * VALUES_PER_LANDMARK];
        raw[index * 5..index * 5 + 5].copy_from_slice(&rec);
        raw
    }

    #[test]
    fn test_decode_returns_full_vocabulary() {
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        };
        let set = decode_landmarks(&raw_with(0, [0.0; 5]), &lb, 256, 256).unwrap();
        assert_eq!(set.len(), LandmarkName::COUNT);
    }

    #[test]
    fn test_decode_undoes_letterbox() {
        // 100x200 crop letterboxed into 256: scale 1.28, pad_x 64
        let lb = Letterbox {
            scale: 1.28,
            pad_x: 64,
            pad_y: 0,
        };
        let shoulder = LandmarkName::LeftShoulder.id() as usize;
        let raw = raw_with(shoulder, [64.0 + 64.0, 128.0, 12.8, 0.0, 1.0]);
        let set = decode_landmarks(&raw, &lb, 100, 200).unwrap();

        let lm = set.get(LandmarkName::LeftShoulder).unwrap();
        assert_relative_eq!(lm.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(lm.y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(lm.z, 0.1, epsilon = 1e-6);
        assert_relative_eq!(lm.visibility, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_visibility_logit_is_squashed() {
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        };
        let set = decode_landmarks(&raw_with(0, [0.0, 0.0, 0.0, 6.0, 0.0]), &lb, 10, 10).unwrap();
        let nose = set.get(LandmarkName::Nose).unwrap();
        assert!(nose.visibility > 0.99 && nose.visibility < 1.0);
    }

    #[test]
    fn test_decode_rejects_short_output() {
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        };
        let err = decode_landmarks(&[0.0; 20], &lb, 10, 10).unwrap_err();
        assert!(matches!(err, EstimationError::UnexpectedOutput(_)));
    }
}
