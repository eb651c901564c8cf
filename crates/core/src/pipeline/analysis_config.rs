use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::domain::biomechanics_analyzer::{
    BiomechanicsAnalyzer, ScoringParams, DEFAULT_MIN_EAR_VISIBILITY,
};
use crate::detection::infrastructure::onnx_person_detector::DEFAULT_CONFIDENCE;
use crate::pose::infrastructure::onnx_pose_landmarker::DEFAULT_PRESENCE_THRESHOLD;
use crate::shared::constants::DEFAULT_CROP_MARGIN;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Tunable parameters of the per-frame analysis.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub scoring: ScoringParams,
    pub min_ear_visibility: f64,
    /// Pixels added on each side of a person box before cropping.
    pub crop_margin: u32,
    pub detector_confidence: f64,
    pub presence_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringParams::default(),
            min_ear_visibility: DEFAULT_MIN_EAR_VISIBILITY,
            crop_margin: DEFAULT_CROP_MARGIN,
            detector_confidence: DEFAULT_CONFIDENCE,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} must be between 0 and 1, got {v}"
                )))
            }
        };
        unit("detector_confidence", self.detector_confidence)?;
        unit("presence_threshold", self.presence_threshold)?;
        unit("min_ear_visibility", self.min_ear_visibility)?;

        let s = &self.scoring;
        for (name, weight) in [
            ("cobb_weight", s.cobb_weight),
            ("cervical_weight", s.cervical_weight),
            ("symmetry_weight", s.symmetry_weight),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }

    pub fn analyzer(&self) -> BiomechanicsAnalyzer {
        BiomechanicsAnalyzer::new(self.scoring, self.min_ear_visibility)
    }
}
