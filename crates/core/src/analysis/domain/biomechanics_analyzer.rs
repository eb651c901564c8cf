use serde::{Deserialize, Serialize};

use super::geometry::{
    angle_between, midpoint, planar_distance, slope_angle, slope_difference, sub, UP,
};
use super::spine_metrics::{PostureType, SpineMetrics};
use crate::pose::domain::landmark::{Landmark, LandmarkName, LandmarkSet};

/// Heuristic thresholds and weights of the composite health score.
///
/// Each penalty is `weight * max(0, excess)`, where the excess is measured
/// past the threshold (above it for angles, below it for symmetry).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub cobb_threshold: f64,
    pub cobb_weight: f64,
    pub cervical_threshold: f64,
    pub cervical_weight: f64,
    pub symmetry_threshold: f64,
    pub symmetry_weight: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            cobb_threshold: 5.0,
            cobb_weight: 3.0,
            cervical_threshold: 20.0,
            cervical_weight: 1.5,
            symmetry_threshold: 95.0,
            symmetry_weight: 2.0,
        }
    }
}

/// Default minimum visibility for an ear to take part in cervical flexion.
pub const DEFAULT_MIN_EAR_VISIBILITY: f64 = 0.5;

/// Derives [`SpineMetrics`] from a frame-normalized landmark set.
///
/// Needs both shoulders and both hips; without them every field is unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomechanicsAnalyzer {
    scoring: ScoringParams,
    min_ear_visibility: f64,
}

impl Default for BiomechanicsAnalyzer {
    fn default() -> Self {
        Self::new(ScoringParams::default(), DEFAULT_MIN_EAR_VISIBILITY)
    }
}

struct Torso<'a> {
    left_shoulder: &'a Landmark,
    right_shoulder: &'a Landmark,
    left_hip: &'a Landmark,
    right_hip: &'a Landmark,
}

impl BiomechanicsAnalyzer {
    pub fn new(scoring: ScoringParams, min_ear_visibility: f64) -> Self {
        Self {
            scoring,
            min_ear_visibility,
        }
    }

    pub fn scoring(&self) -> &ScoringParams {
        &self.scoring
    }

    pub fn analyze(&self, landmarks: &LandmarkSet) -> SpineMetrics {
        let Some(torso) = torso(landmarks) else {
            return SpineMetrics::default();
        };

        let cobb = thoracic_cobb(&torso);
        let lumbar = lumbar_flexion(&torso);
        let cervical = self.cervical_flexion(landmarks, &torso);
        let symmetry = symmetry_index(&torso);

        let p = &self.scoring;
        let mut score = 100.0;
        let mut posture = PostureType::Neutral;

        if let Some(cobb) = cobb {
            score -= p.cobb_weight * (cobb - p.cobb_threshold).max(0.0);
        }
        if let Some(cervical) = cervical {
            if cervical > p.cervical_threshold {
                score -= p.cervical_weight * (cervical - p.cervical_threshold);
                posture = PostureType::ForwardHead;
            }
        }
        if let Some(symmetry) = symmetry {
            score -= p.symmetry_weight * (p.symmetry_threshold - symmetry).max(0.0);
        }

        SpineMetrics {
            cobb_angle_thoracic: cobb,
            cervical_flexion: cervical,
            lumbar_flexion: lumbar,
            symmetry_index: symmetry,
            posture_type: Some(posture),
            health_score: Some(f64::max(score, 0.0)),
        }
    }

    /// Angle of mid-shoulder -> mid-ear against vertical.
    ///
    /// Unavailable unless both ears are present and visible enough.
    fn cervical_flexion(&self, landmarks: &LandmarkSet, torso: &Torso) -> Option<f64> {
        let visible = |name| {
            landmarks
                .get(name)
                .filter(|lm| lm.is_visible(self.min_ear_visibility))
        };
        let left_ear = visible(LandmarkName::LeftEar)?;
        let right_ear = visible(LandmarkName::RightEar)?;

        let mid_shoulder = midpoint(torso.left_shoulder, torso.right_shoulder);
        let mid_ear = midpoint(left_ear, right_ear);
        angle_between(sub(mid_ear, mid_shoulder), UP)
    }
}

/// Analyzes `landmarks` with default scoring parameters.
pub fn analyze(landmarks: &LandmarkSet) -> SpineMetrics {
    BiomechanicsAnalyzer::default().analyze(landmarks)
}

fn torso(landmarks: &LandmarkSet) -> Option<Torso<'_>> {
    Some(Torso {
        left_shoulder: landmarks.get(LandmarkName::LeftShoulder)?,
        right_shoulder: landmarks.get(LandmarkName::RightShoulder)?,
        left_hip: landmarks.get(LandmarkName::LeftHip)?,
        right_hip: landmarks.get(LandmarkName::RightHip)?,
    })
}

fn thoracic_cobb(t: &Torso) -> Option<f64> {
    let shoulder = slope_angle(t.left_shoulder, t.right_shoulder)?;
    let hip = slope_angle(t.left_hip, t.right_hip)?;
    slope_difference(shoulder, hip)
}

fn lumbar_flexion(t: &Torso) -> Option<f64> {
    let mid_hip = midpoint(t.left_hip, t.right_hip);
    let mid_shoulder = midpoint(t.left_shoulder, t.right_shoulder);
    angle_between(sub(mid_shoulder, mid_hip), UP)
}

fn symmetry_index(t: &Torso) -> Option<f64> {
    let left = planar_distance(t.left_shoulder, t.left_hip);
    let right = planar_distance(t.right_shoulder, t.right_hip);
    if !left.is_finite() || !right.is_finite() {
        return None;
    }
    let longer = left.max(right);
    if longer == 0.0 {
        return None;
    }
    let ratio = 100.0 * left.min(right) / longer;
    ratio.is_finite().then_some(ratio)
}
