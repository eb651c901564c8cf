use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::domain::spine_metrics::SpineMetrics;

/// Audience the narrative is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeContext {
    #[default]
    Medical,
    Sports,
}

impl NarrativeContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeContext::Medical => "medical",
            NarrativeContext::Sports => "sports",
        }
    }
}

impl fmt::Display for NarrativeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NarrativeContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "medical" => Ok(NarrativeContext::Medical),
            "sports" => Ok(NarrativeContext::Sports),
            other => Err(format!(
                "unknown narrative context '{other}' (expected medical or sports)"
            )),
        }
    }
}

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("narrative generation unavailable: {0}")]
    Unavailable(String),
    #[error("narrative request failed: {0}")]
    Request(String),
    #[error("narrative service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("narrative service returned no text")]
    EmptyResponse,
}

/// Produces free-text feedback from spine metrics.
pub trait NarrativeGenerator: Send {
    fn generate(
        &self,
        metrics: &SpineMetrics,
        context: NarrativeContext,
    ) -> Result<String, NarrativeError>;
}

pub const UNAVAILABLE_TEXT: &str = "AI Analysis Unavailable (Key Missing)";

/// Runs `generator`, turning any failure into fixed fallback text.
pub fn narrative_or_fallback(
    generator: &dyn NarrativeGenerator,
    metrics: &SpineMetrics,
    context: NarrativeContext,
) -> String {
    match generator.generate(metrics, context) {
        Ok(text) => text,
        Err(NarrativeError::Unavailable(reason)) => {
            log::debug!("Narrative unavailable: {reason}");
            UNAVAILABLE_TEXT.to_string()
        }
        Err(e) => {
            log::warn!("{e}");
            format!("AI Error: {e}")
        }
    }
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

/// Builds the instruction text sent to a language model.
pub fn build_prompt(metrics: &SpineMetrics, context: NarrativeContext) -> String {
    let cobb = fmt_metric(metrics.cobb_angle_thoracic);
    let lumbar = fmt_metric(metrics.lumbar_flexion);
    let cervical = fmt_metric(metrics.cervical_flexion);
    let symmetry = fmt_metric(metrics.symmetry_index);
    let score = fmt_metric(metrics.health_score);
    let posture = metrics
        .posture_type
        .map_or_else(|| "n/a".to_string(), |p| p.to_string());

    match context {
        NarrativeContext::Medical => format!(
            "Act as a radiologist writing the impression section of a spinal alignment report.\n\
             \n\
             Biometrics estimated from a single camera frame:\n\
             - Thoracic Cobb angle surrogate: {cobb} degrees\n\
             - Lumbar flexion: {lumbar} degrees\n\
             - Cervical flexion: {cervical} degrees\n\
             - Torso symmetry index: {symmetry}/100\n\
             - Posture: {posture}\n\
             - Postural health index: {score}/100\n\
             \n\
             Write a concise clinical impression focused on spinal alignment, possible \
             scoliosis (Cobb above 10) and lordosis. Use professional terminology. \
             Output only the impression."
        ),
        NarrativeContext::Sports => format!(
            "Act as a biomechanics coach reviewing a movement screen.\n\
             \n\
             Athlete metrics:\n\
             - Spine flexion: {lumbar} degrees\n\
             - Neck flexion: {cervical} degrees\n\
             - Stability index: {score}/100\n\
             \n\
             Give one short, actionable correction cue focused on neutral spine and \
             injury prevention."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Fixed(Result<&'static str, fn() -> NarrativeError>);

    impl NarrativeGenerator for Fixed {
        fn generate(
            &self,
            _metrics: &SpineMetrics,
            _context: NarrativeContext,
        ) -> Result<String, NarrativeError> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    #[rstest]
    #[case("medical", NarrativeContext::Medical)]
    #[case("Sports", NarrativeContext::Sports)]
    fn test_context_parses(#[case] text: &str, #[case] expected: NarrativeContext) {
        assert_eq!(text.parse::<NarrativeContext>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_context_is_rejected() {
        assert!("yoga".parse::<NarrativeContext>().is_err());
    }

    #[test]
    fn test_success_passes_text_through() {
        let gen = Fixed(Ok("Cue: brace core"));
        let text = narrative_or_fallback(&gen, &SpineMetrics::default(), NarrativeContext::Sports);
        assert_eq!(text, "Cue: brace core");
    }

    #[test]
    fn test_unavailable_uses_fixed_text() {
        let gen = Fixed(Err(|| NarrativeError::Unavailable("no key".into())));
        let text = narrative_or_fallback(&gen, &SpineMetrics::default(), NarrativeContext::Medical);
        assert_eq!(text, UNAVAILABLE_TEXT);
    }

    #[test]
    fn test_failure_becomes_error_text() {
        let gen = Fixed(Err(|| NarrativeError::Api {
            status: 500,
            body: "oops".into(),
        }));
        let text = narrative_or_fallback(&gen, &SpineMetrics::default(), NarrativeContext::Medical);
        assert!(text.starts_with("AI Error:"));
        assert!(text.contains("500"));
    }

    #[test]
    fn test_prompt_formats_metrics_and_missing_values() {
        let metrics = SpineMetrics {
            cobb_angle_thoracic: Some(12.345),
            health_score: Some(80.0),
            ..Default::default()
        };
        let prompt = build_prompt(&metrics, NarrativeContext::Medical);
        assert!(prompt.contains("12.3 degrees"));
        assert!(prompt.contains("80.0/100"));
        assert!(prompt.contains("Lumbar flexion: n/a"));

        let sports = build_prompt(&metrics, NarrativeContext::Sports);
        assert!(sports.contains("correction cue"));
        assert!(!sports.contains("Cobb"));
    }
}
