use std::time::Duration;

use serde_json::{json, Value};

use crate::analysis::domain::spine_metrics::SpineMetrics;
use crate::narrative::domain::narrative_generator::{
    build_prompt, NarrativeContext, NarrativeError, NarrativeGenerator,
};
use crate::shared::constants::GEMINI_API_KEY_ENV;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Narrative generator backed by the Gemini `generateContent` REST API.
pub struct GeminiNarrator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl GeminiNarrator {
    pub fn new(api_key: String, model: &str) -> Result<Self, NarrativeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NarrativeError::Request(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
        })
    }

    /// Builds a narrator from `GEMINI_API_KEY`, or `None` when it is unset.
    pub fn from_env() -> Option<Result<Self, NarrativeError>> {
        let key = std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        Some(Self::new(key, DEFAULT_MODEL))
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }
}

impl NarrativeGenerator for GeminiNarrator {
    fn generate(
        &self,
        metrics: &SpineMetrics,
        context: NarrativeContext,
    ) -> Result<String, NarrativeError> {
        let body = request_body(&build_prompt(metrics, context));
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(|e| NarrativeError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| NarrativeError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value =
            serde_json::from_str(&text).map_err(|e| NarrativeError::Request(e.to_string()))?;
        extract_text(&payload).ok_or(NarrativeError::EmptyResponse)
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ]
    })
}

/// Concatenates the text parts of the first candidate.
fn extract_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_wraps_prompt() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [ { "text": "Impression: " }, { "text": "mild tilt.\n" } ] }
            }]
        });
        assert_eq!(
            extract_text(&payload).as_deref(),
            Some("Impression: mild tilt.")
        );
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        assert_eq!(extract_text(&json!({ "promptFeedback": {} })), None);
        let blank = json!({ "candidates": [{ "content": { "parts": [ { "text": "  " } ] } }] });
        assert_eq!(extract_text(&blank), None);
    }

    #[test]
    fn test_endpoint_includes_model() {
        let narrator = GeminiNarrator::new("key".into(), "gemini-test").unwrap();
        assert_eq!(
            narrator.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }
}
