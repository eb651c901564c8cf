/// YOLO person detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, person-class filtering and
/// NMS post-processing. Boxes come back in full-frame pixels, clamped to the
/// frame, highest confidence first.
use std::path::Path;

use crate::detection::domain::person_detector::{DetectionError, PersonDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::shared::letterbox::{letterbox, Letterbox, TensorLayout};
use crate::shared::onnx_session::{load_session, square_input_size};

use super::nms::{nms, RawDetection};

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for person detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Index of the person class score within a detection row (after cx, cy, w, h).
const PERSON_SCORE_INDEX: usize = 4;

/// YOLO letterbox padding (114/255 gray).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Multi-class YOLO detector restricted to the person category.
pub struct OnnxPersonDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxPersonDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = square_input_size(&session, false).unwrap_or(DEFAULT_INPUT_SIZE);
        log::info!(
            "Person detection model loaded ({input_size}x{input_size}) from {}",
            model_path.display()
        );
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl PersonDetector for OnnxPersonDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, lb) = letterbox(frame, self.input_size, TensorLayout::Nchw, PAD_VALUE);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(DetectionError::UnexpectedOutput(
                "YOLO model produced no outputs".to_string(),
            ));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::UnexpectedOutput(e.to_string()))?;
        let shape = tensor.shape().to_vec();
        let data: Vec<f32> = tensor.iter().copied().collect();

        // 3. Parse person rows, 4. NMS
        let mut raw = parse_person_rows(&data, &shape, self.confidence, &lb)?;
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        // 5. Clamp into integer frame boxes
        let boxes = to_frame_boxes(&kept, frame.width(), frame.height());
        log::debug!("Detected {} person(s) in frame {}", boxes.len(), frame.index());
        Ok(boxes)
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Reads `[cx, cy, w, h, class scores...]` rows and keeps confident persons.
///
/// A row counts as a person only when the person score is its best class
/// score; ties go to the person class.
///
/// YOLO output shape is `[1, features, detections]` (transposed) or
/// `[1, detections, features]`; both are handled.
fn parse_person_rows(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    lb: &Letterbox,
) -> Result<Vec<RawDetection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "unexpected YOLO output shape: {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= PERSON_SCORE_INDEX || data.len() < num_dets * num_feats {
        return Err(DetectionError::UnexpectedOutput(format!(
            "YOLO output too small for shape {shape:?}"
        )));
    }

    let value = |det: usize, feat: usize| -> f64 {
        if transposed {
            data[feat * num_dets + det] as f64
        } else {
            data[det * num_feats + feat] as f64
        }
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, PERSON_SCORE_INDEX);
        if conf < confidence {
            continue;
        }
        let outscored = ((PERSON_SCORE_INDEX + 1)..num_feats).any(|feat| value(i, feat) > conf);
        if outscored {
            continue;
        }
        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        let (x1, y1) = lb.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = lb.unmap(cx + w / 2.0, cy + h / 2.0);
        dets.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: conf,
        });
    }
    Ok(dets)
}

fn to_frame_boxes(dets: &[RawDetection], frame_w: u32, frame_h: u32) -> Vec<BoundingBox> {
    let fw = frame_w as f64;
    let fh = frame_h as f64;
    dets.iter()
        .filter_map(|d| {
            BoundingBox::new(
                d.x1.clamp(0.0, fw) as i32,
                d.y1.clamp(0.0, fh) as i32,
                d.x2.clamp(0.0, fw) as i32,
                d.y2.clamp(0.0, fh) as i32,
                d.confidence,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    /// Rows of `[cx, cy, w, h, person, other]` in `[1, dets, feats]` layout.
    fn rows(rows: &[[f32; 6]]) -> (Vec<f32>, Vec<usize>) {
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        (data, vec![1, rows.len().max(7), 6])
    }

    #[test]
    fn test_parse_keeps_only_confident_persons() {
        let (mut data, shape) = rows(&[
            [50.0, 50.0, 20.0, 40.0, 0.9, 0.0],
            [80.0, 80.0, 10.0, 10.0, 0.1, 0.95],
        ]);
        data.resize(shape[1] * shape[2], 0.0);
        let dets = parse_person_rows(&data, &shape, 0.25, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 1);
        assert!((dets[0].x1 - 40.0).abs() < 1e-6);
        assert!((dets[0].y2 - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_drops_rows_whose_best_class_is_not_person() {
        let (mut data, shape) = rows(&[
            [50.0, 50.0, 20.0, 40.0, 0.30, 0.95],
            [90.0, 90.0, 20.0, 20.0, 0.60, 0.60],
        ]);
        data.resize(shape[1] * shape[2], 0.0);
        let dets = parse_person_rows(&data, &shape, 0.25, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 1);
        assert!((dets[0].x1 - 80.0).abs() < 1e-6);
        assert!((dets[0].confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_parse_transposed_layout() {
        // [1, 6 feats, 8 dets]: only det 2 is a person
        let num_dets = 8;
        let mut data = vec![0.0f32; 6 * num_dets];
        let set = |data: &mut Vec<f32>, feat: usize, v: f32| data[feat * num_dets + 2] = v;
        set(&mut data, 0, 100.0);
        set(&mut data, 1, 60.0);
        set(&mut data, 2, 40.0);
        set(&mut data, 3, 80.0);
        set(&mut data, 4, 0.7);

        let dets = parse_person_rows(&data, &[1, 6, num_dets], 0.25, &IDENTITY).unwrap();
        assert_eq!(dets.len(), 1);
        assert!((dets[0].x1 - 80.0).abs() < 1e-6);
        assert!((dets[0].y1 - 20.0).abs() < 1e-6);
        assert!((dets[0].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_parse_undoes_letterbox() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let (mut data, shape) = rows(&[[100.0, 200.0, 40.0, 40.0, 0.8, 0.0]]);
        data.resize(shape[1] * shape[2], 0.0);
        let dets = parse_person_rows(&data, &shape, 0.25, &lb).unwrap();
        assert!((dets[0].x1 - 40.0).abs() < 1e-6);
        assert!((dets[0].y1 - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        let err = parse_person_rows(&[0.0; 4], &[4], 0.25, &IDENTITY).unwrap_err();
        assert!(matches!(err, DetectionError::UnexpectedOutput(_)));
    }

    #[test]
    fn test_to_frame_boxes_clamps_and_drops_degenerate() {
        let dets = vec![
            RawDetection {
                x1: -20.0,
                y1: 10.0,
                x2: 50.0,
                y2: 500.0,
                confidence: 0.9,
            },
            RawDetection {
                x1: 700.0,
                y1: 10.0,
                x2: 800.0,
                y2: 50.0,
                confidence: 0.8,
            },
        ];
        let boxes = to_frame_boxes(&dets, 640, 480);
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].x1, boxes[0].y2), (0, 480));
    }
}
