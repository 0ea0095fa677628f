//! Gemini `generateContent` client implementation.
//!
//! One synchronous request per audit run; failures are fatal to the run,
//! with no retries and no partial results.

use deckscan_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Gemini model used for analysis.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Default API endpoint base.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Request timeout. Long decks take the model a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Blocking client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client with the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::ApiError(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint base URL (used for self-hosted proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The model this client will query.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the analysis prompt and return the model's report text.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let url = generate_content_url(&self.endpoint, &self.model);
        let request = GenerateContentRequest::from_prompt(prompt);

        log::debug!("POST {} ({} prompt bytes)", url, prompt.len());

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::ApiError(format!("request to Gemini failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::ApiError(format!(
                "Gemini returned HTTP {}: {}",
                status,
                truncate_for_log(&body)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| Error::ApiError(format!("decoding Gemini response: {}", e)))?;

        extract_report_text(parsed)
    }
}

/// Build the full `generateContent` URL for a model.
fn generate_content_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model
    )
}

/// Pull the report text out of a decoded response, mapping the failure
/// modes (blocked prompt, no candidates, empty parts) to errors.
fn extract_report_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(Error::EmptyResponse(format!(
                "prompt was blocked: {}",
                reason
            )));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::EmptyResponse("no candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(Error::EmptyResponse(
            "candidate contained no text parts".to_string(),
        ));
    }

    Ok(text)
}

/// Keep error bodies readable in terminal output.
fn truncate_for_log(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

// Wire types. Only the fields we read are modeled; Gemini sends more.

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_content_url() {
        assert_eq!(
            generate_content_url(DEFAULT_ENDPOINT, "gemini-1.5-flash-latest"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
        // Trailing slash on the endpoint does not double up
        assert_eq!(
            generate_content_url("http://localhost:8080/", "m"),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest::from_prompt("analyze this");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "analyze this");
    }

    #[test]
    fn test_extract_report_text_happy_path() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "**Conflicting Revenue** "}, {"text": "Slide 2 vs. Slide 4."}], "role": "model"}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(
            extract_report_text(parsed).unwrap(),
            "**Conflicting Revenue** Slide 2 vs. Slide 4."
        );
    }

    #[test]
    fn test_extract_report_text_no_candidates() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();

        assert!(matches!(
            extract_report_text(parsed),
            Err(Error::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_extract_report_text_blocked_prompt() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();

        let err = extract_report_text(parsed).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_report_text_empty_parts() {
        let raw = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();

        assert!(matches!(
            extract_report_text(parsed),
            Err(Error::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");
        let long = "x".repeat(600);
        let truncated = truncate_for_log(&long);
        assert!(truncated.len() < 600);
        assert!(truncated.ends_with("..."));
    }
}
