//! Gemini REST provider for text generation.
//!
//! Minimal client for the `generateContent` endpoint. No retry and no
//! streaming: the pipeline makes exactly one attempt per call and consumes
//! the response as a single string.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::TextGenerator;
use crate::error::GenerationCallError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model for both generation calls.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// [`TextGenerator`] backed by the Gemini REST API.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    /// Create a generator for [`DEFAULT_GEMINI_MODEL`].
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_GEMINI_MODEL)
    }

    /// Create a generator for a specific model name.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Model name this generator calls.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationCallError> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        debug!(
            "Gemini request: model={}, prompt {} chars",
            self.model,
            prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationCallError::new(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationCallError::new(format!(
                "Gemini returned HTTP {status}: {detail}"
            )));
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|e| {
            GenerationCallError::new(format!("Gemini response could not be decoded: {e}"))
        })?;

        response_text(payload)
    }
}

// The key never appears in logs or panics.
impl fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Concatenated text parts of the first candidate.
///
/// Kept separate from the trait impl so response handling is testable from
/// canned JSON without network access.
fn response_text(payload: GenerateContentResponse) -> Result<String, GenerationCallError> {
    let candidate = payload
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationCallError::new("Gemini returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationCallError::new(
            "Gemini candidate contained no text (response may have been blocked)",
        ));
    }
    Ok(text)
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extracts_text_from_first_candidate() {
        let payload = decode(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}],"role":"model"},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(response_text(payload).unwrap(), "Hello world");
    }

    #[test]
    fn no_candidates_is_an_error() {
        let payload = decode(r#"{"candidates":[]}"#);
        let err = response_text(payload).unwrap_err();
        assert!(err.to_string().contains("no candidates"), "got: {err}");
    }

    #[test]
    fn blocked_candidate_without_text_is_an_error() {
        let payload = decode(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        let err = response_text(payload).unwrap_err();
        assert!(err.to_string().contains("no text"), "got: {err}");
    }

    #[test]
    fn debug_redacts_the_key() {
        let gen = GeminiGenerator::new("top-secret");
        let dump = format!("{gen:?}");
        assert!(!dump.contains("top-secret"), "got: {dump}");
        assert!(dump.contains(DEFAULT_GEMINI_MODEL), "got: {dump}");
    }
}
