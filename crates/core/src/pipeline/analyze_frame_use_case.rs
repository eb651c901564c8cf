use std::time::Instant;

use thiserror::Error;

use crate::analysis::domain::biomechanics_analyzer::BiomechanicsAnalyzer;
use crate::detection::domain::person_detector::{DetectionError, PersonDetector};
use crate::pipeline::frame_result::{FrameResult, PersonResult};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pose::domain::landmark_estimator::LandmarkEstimator;
use crate::pose::domain::remap::remap_to_frame;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::PLACEHOLDER_PERSON_ID;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Per-frame posture analysis: detect → crop → estimate → remap → analyze.
///
/// Stateless across frames apart from the injected model handles. Boxes
/// whose crop is empty, or whose estimation fails or finds no body, are
/// dropped; only a detector failure aborts the frame.
pub struct AnalyzeFrameUseCase {
    detector: Box<dyn PersonDetector>,
    estimator: Box<dyn LandmarkEstimator>,
    analyzer: BiomechanicsAnalyzer,
    crop_margin: u32,
    logger: Box<dyn PipelineLogger>,
}

impl AnalyzeFrameUseCase {
    pub fn new(
        detector: Box<dyn PersonDetector>,
        estimator: Box<dyn LandmarkEstimator>,
        analyzer: BiomechanicsAnalyzer,
        crop_margin: u32,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            detector,
            estimator,
            analyzer,
            crop_margin,
            logger,
        }
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        &*self.logger
    }

    pub fn execute(&mut self, frame: &Frame) -> Result<FrameResult, PipelineError> {
        let mut result = FrameResult::empty(frame.index(), frame.timestamp_ms());
        if frame.is_empty() {
            self.logger
                .skipped(&format!("frame {} is empty", frame.index()));
            self.logger.frame_done(frame.index(), 0);
            return Ok(result);
        }

        let t0 = Instant::now();
        let boxes = self.detector.detect(frame)?;
        self.logger
            .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
        self.logger.metric("boxes", boxes.len() as f64);

        for bbox in boxes {
            if let Some(person) = self.analyze_box(frame, bbox) {
                result.persons.push(person);
            }
        }

        self.logger.frame_done(frame.index(), result.persons.len());
        Ok(result)
    }

    fn analyze_box(&mut self, frame: &Frame, bbox: BoundingBox) -> Option<PersonResult> {
        let window = bbox.padded_window(self.crop_margin, frame.width(), frame.height());
        if window.is_empty() {
            self.logger.skipped(&format!(
                "box ({}, {}, {}, {}) has no area inside the frame",
                bbox.x1, bbox.y1, bbox.x2, bbox.y2
            ));
            return None;
        }

        let crop = frame
            .crop(window.x, window.y, window.width, window.height)
            .to_channel_order(self.estimator.channel_order());

        let t0 = Instant::now();
        let estimated = self.estimator.estimate(&crop);
        self.logger
            .timing("estimate", t0.elapsed().as_secs_f64() * 1000.0);

        let crop_landmarks = match estimated {
            Ok(Some(landmarks)) => landmarks,
            Ok(None) => return None,
            Err(e) => {
                self.logger.skipped(&format!("landmark estimation failed: {e}"));
                return None;
            }
        };

        let landmarks = match remap_to_frame(&crop_landmarks, &window, frame.width(), frame.height())
        {
            Ok(landmarks) => landmarks,
            Err(e) => {
                self.logger.skipped(&e.to_string());
                return None;
            }
        };

        let t0 = Instant::now();
        let metrics = self.analyzer.analyze(&landmarks);
        self.logger
            .timing("analyze", t0.elapsed().as_secs_f64() * 1000.0);

        Some(PersonResult {
            person_id: PLACEHOLDER_PERSON_ID,
            bbox,
            landmarks,
            metrics: Some(metrics),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pose::domain::landmark::{Landmark, LandmarkName, LandmarkSet};
    use crate::pose::domain::landmark_estimator::EstimationError;
    use crate::shared::frame::ChannelOrder;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubDetector {
        boxes: Vec<BoundingBox>,
    }

    impl PersonDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
            Ok(self.boxes.clone())
        }
    }

    struct FailingDetector;

    impl PersonDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
            Err(DetectionError::Inference("model crashed".into()))
        }
    }

    /// Seen crops as (width, height, order).
    type CropLog = Arc<Mutex<Vec<(u32, u32, ChannelOrder)>>>;

    /// Returns one scripted outcome per call, recording each crop.
    struct ScriptedEstimator {
        outcomes: Vec<Result<Option<LandmarkSet>, EstimationError>>,
        order: ChannelOrder,
        crops: CropLog,
    }

    impl ScriptedEstimator {
        fn new(outcomes: Vec<Result<Option<LandmarkSet>, EstimationError>>) -> (Self, CropLog) {
            let crops = CropLog::default();
            let estimator = Self {
                outcomes,
                order: ChannelOrder::Rgb,
                crops: crops.clone(),
            };
            (estimator, crops)
        }
    }

    impl LandmarkEstimator for ScriptedEstimator {
        fn channel_order(&self) -> ChannelOrder {
            self.order
        }

        fn estimate(&mut self, crop: &Frame) -> Result<Option<LandmarkSet>, EstimationError> {
            self.crops
                .lock()
                .unwrap()
                .push((crop.width(), crop.height(), crop.channel_order()));
            if self.outcomes.is_empty() {
                Ok(None)
            } else {
                self.outcomes.remove(0)
            }
        }
    }

    /// Upright torso centered in the crop.
    fn torso() -> LandmarkSet {
        [
            (LandmarkName::LeftShoulder, Landmark::new(0.6, 0.3, 0.0, 0.9)),
            (LandmarkName::RightShoulder, Landmark::new(0.4, 0.3, 0.0, 0.9)),
            (LandmarkName::LeftHip, Landmark::new(0.6, 0.6, 0.0, 0.9)),
            (LandmarkName::RightHip, Landmark::new(0.4, 0.6, 0.0, 0.9)),
        ]
        .into_iter()
        .collect()
    }

    fn bbox(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f64) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2, confidence).unwrap()
    }

    fn frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 7).with_timestamp_ms(250.0)
    }

    fn use_case(
        detector: impl PersonDetector + 'static,
        estimator: ScriptedEstimator,
    ) -> AnalyzeFrameUseCase {
        AnalyzeFrameUseCase::new(
            Box::new(detector),
            Box::new(estimator),
            BiomechanicsAnalyzer::default(),
            10,
            Box::new(NullPipelineLogger),
        )
    }

    #[test]
    fn test_zero_boxes_yield_empty_result() {
        let (estimator, crops) = ScriptedEstimator::new(vec![]);
        let mut uc = use_case(StubDetector { boxes: vec![] }, estimator);

        let result = uc.execute(&frame(64, 48)).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.frame_id, 7);
        assert_relative_eq!(result.timestamp_ms, 250.0);
        assert!(crops.lock().unwrap().is_empty());
    }

    #[test]
    fn test_landmarks_are_remapped_to_full_frame() {
        // Box (60,60)-(140,140) padded by 10 → crop (50,50) 100x100 in 400x300
        let mut set = torso();
        set.insert(LandmarkName::Nose, Landmark::new(0.5, 0.5, -0.2, 0.7));
        let (estimator, crops) = ScriptedEstimator::new(vec![Ok(Some(set))]);
        let mut uc = use_case(
            StubDetector {
                boxes: vec![bbox(60, 60, 140, 140, 0.9)],
            },
            estimator,
        );

        let result = uc.execute(&frame(400, 300)).unwrap();
        assert_eq!(result.persons.len(), 1);
        assert_eq!(crops.lock().unwrap()[0], (100, 100, ChannelOrder::Rgb));

        let person = &result.persons[0];
        assert_eq!(person.person_id, PLACEHOLDER_PERSON_ID);
        assert_eq!(person.bbox, bbox(60, 60, 140, 140, 0.9));
        let nose = person.landmarks.get(LandmarkName::Nose).unwrap();
        assert_relative_eq!(nose.x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(nose.y, 100.0 / 300.0, epsilon = 1e-12);
        assert_relative_eq!(nose.z, -0.2);
        assert_relative_eq!(nose.visibility, 0.7);
    }

    #[test]
    fn test_metrics_are_computed_on_remapped_landmarks() {
        let (estimator, _) = ScriptedEstimator::new(vec![Ok(Some(torso()))]);
        let mut uc = use_case(
            StubDetector {
                boxes: vec![bbox(10, 10, 90, 190, 0.8)],
            },
            estimator,
        );

        let result = uc.execute(&frame(200, 200)).unwrap();
        let metrics = result.persons[0].metrics.as_ref().unwrap();
        assert_relative_eq!(metrics.health_score.unwrap(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.lumbar_flexion.unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_box_outside_frame_is_skipped_without_error() {
        let (estimator, crops) = ScriptedEstimator::new(vec![Ok(Some(torso()))]);
        let mut uc = use_case(
            StubDetector {
                boxes: vec![bbox(500, 500, 600, 600, 0.9)],
            },
            estimator,
        );

        let result = uc.execute(&frame(100, 100)).unwrap();
        assert!(result.is_empty());
        assert!(crops.lock().unwrap().is_empty());
    }

    #[test]
    fn test_crop_is_clamped_to_frame_bounds() {
        let (estimator, crops) = ScriptedEstimator::new(vec![Ok(Some(torso()))]);
        let mut uc = use_case(
            StubDetector {
                boxes: vec![bbox(0, 0, 50, 40, 0.9)],
            },
            estimator,
        );

        uc.execute(&frame(55, 45)).unwrap();
        assert_eq!(crops.lock().unwrap()[0], (55, 45, ChannelOrder::Rgb));
    }

    #[test]
    fn test_boxes_without_landmarks_are_dropped_in_order() {
        let (estimator, _) = ScriptedEstimator::new(vec![
            Ok(Some(torso())),
            Ok(None),
            Err(EstimationError::Inference("bad crop".into())),
            Ok(Some(torso())),
        ]);
        let boxes = vec![
            bbox(10, 10, 50, 90, 0.95),
            bbox(60, 10, 100, 90, 0.9),
            bbox(110, 10, 150, 90, 0.8),
            bbox(160, 10, 190, 90, 0.7),
        ];
        let mut uc = use_case(StubDetector { boxes }, estimator);

        let result = uc.execute(&frame(200, 100)).unwrap();
        let confidences: Vec<f64> = result.persons.iter().map(|p| p.bbox.confidence).collect();
        assert_eq!(confidences, vec![0.95, 0.7]);
    }

    #[test]
    fn test_crop_is_converted_to_estimator_channel_order() {
        let (mut estimator, crops) = ScriptedEstimator::new(vec![Ok(None)]);
        estimator.order = ChannelOrder::Bgr;
        let mut uc = use_case(
            StubDetector {
                boxes: vec![bbox(20, 20, 40, 40, 0.9)],
            },
            estimator,
        );

        uc.execute(&frame(100, 100)).unwrap();
        assert_eq!(crops.lock().unwrap()[0].2, ChannelOrder::Bgr);
    }

    #[test]
    fn test_detector_failure_propagates() {
        let (estimator, _) = ScriptedEstimator::new(vec![]);
        let mut uc = use_case(FailingDetector, estimator);

        let err = uc.execute(&frame(32, 32)).unwrap_err();
        assert!(matches!(err, PipelineError::Detection(_)));
    }

    #[test]
    fn test_empty_frame_yields_empty_result() {
        let (estimator, _) = ScriptedEstimator::new(vec![]);
        let mut uc = use_case(FailingDetector, estimator);

        let empty = Frame::new(Vec::new(), 0, 0, 3, 2);
        let result = uc.execute(&empty).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.frame_id, 2);
    }
}
