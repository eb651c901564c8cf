use serde::{Deserialize, Serialize};

use crate::analysis::domain::spine_metrics::SpineMetrics;
use crate::pose::domain::landmark::LandmarkSet;
use crate::shared::bounding_box::BoundingBox;

/// Analysis of one detected person in one frame.
///
/// `person_id` is a placeholder and does not identify the same person
/// across frames. Landmarks are normalized to the full frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonResult {
    pub person_id: u32,
    pub bbox: BoundingBox,
    pub landmarks: LandmarkSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SpineMetrics>,
}

/// All person results for one frame, in detection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_id: usize,
    pub timestamp_ms: f64,
    pub persons: Vec<PersonResult>,
}

impl FrameResult {
    pub fn empty(frame_id: usize, timestamp_ms: f64) -> Self {
        Self {
            frame_id,
            timestamp_ms,
            persons: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// The first (highest-confidence) person, if any.
    pub fn primary(&self) -> Option<&PersonResult> {
        self.persons.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame_result_serializes_empty_persons() {
        let result = FrameResult::empty(3, 100.0);
        assert!(result.is_empty());
        assert!(result.primary().is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["frame_id"], 3);
        assert_eq!(json["persons"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_person_without_metrics_omits_field() {
        let person = PersonResult {
            person_id: 0,
            bbox: BoundingBox::new(0, 0, 10, 20, 0.8).unwrap(),
            landmarks: LandmarkSet::new(),
            metrics: None,
        };
        let json = serde_json::to_value(&person).unwrap();
        assert!(json.get("metrics").is_none());
        assert_eq!(json["bbox"]["x2"], 10);
    }
}
