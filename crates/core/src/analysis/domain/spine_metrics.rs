use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical posture label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureType {
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Forward Head")]
    ForwardHead,
}

impl fmt::Display for PostureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureType::Neutral => f.write_str("Neutral"),
            PostureType::ForwardHead => f.write_str("Forward Head"),
        }
    }
}

/// Spine metrics for one person in one frame.
///
/// Every field is independently optional. An unavailable metric is `None`
/// and is omitted from serialized output rather than written as 0.
/// Angles are in degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpineMetrics {
    /// Divergence between the shoulder line and the hip line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cobb_angle_thoracic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cervical_flexion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lumbar_flexion: Option<f64>,
    /// 100 means both torso sides have equal length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetry_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posture_type: Option<PostureType>,
    /// Composite score in [0, 100].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
}

impl SpineMetrics {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == SpineMetrics::default()
    }
}
