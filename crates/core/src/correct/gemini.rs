//! Gemini-backed corrector implementation.
//! This sends the chunk text together with the reference configuration to
//! the generateContent endpoint and expects the corrected lines back.

use super::{read_reference_documents, Corrector, ReferenceConfig};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Corrector that delegates to the Gemini generateContent API.
#[derive(Clone)]
pub struct GeminiCorrector {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiCorrector {
    /// Create a new corrector reading the API key from `GEMINI_API_KEY`.
    pub fn new(model: Option<String>) -> Result<Self> {
        let key = std::env::var("GEMINI_API_KEY")?;
        Ok(Self::with_endpoint(
            DEFAULT_ENDPOINT.to_string(),
            key,
            model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        ))
    }

    /// Create a corrector against an explicit endpoint, used by tests.
    pub fn with_endpoint(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
            model,
        }
    }

    /// Send a JSON body to the generateContent endpoint and return the
    /// JSON response.
    async fn post_generate(&self, body: Value) -> Result<Value> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        );
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = resp.error_for_status()?;
        Ok(resp.json().await?)
    }
}

/// Build the system instruction for a correction run.
/// The line-count rule is the load-bearing part: the merger pairs the
/// corrected lines with timecode blocks purely by position.
fn system_instruction(config: &ReferenceConfig) -> String {
    let characters = if config.characters.is_empty() {
        "(none)".to_string()
    } else {
        config.characters.join(", ")
    };
    let movies = if config.movies.is_empty() {
        "(none)".to_string()
    } else {
        config.movies.join(", ")
    };
    format!(
        "You are an expert subtitle proofreader. Correct the spelling, \
         spacing and proper-noun usage of the provided subtitle lines.\n\
         \n\
         The input is plain text without timecodes; each line is one \
         subtitle block. Never add or remove line breaks: the output must \
         have exactly the same number of lines as the input.\n\
         \n\
         Character names to preserve: {characters}\n\
         Movie titles, always wrapped in angle brackets like <Inception>: {movies}\n\
         Remove sentence-final periods for readability; keep question and \
         exclamation marks.\n\
         \n\
         Output only the corrected lines, nothing else."
    )
}

#[async_trait]
impl Corrector for GeminiCorrector {
    /// Correct a text segment, inlining text-like reference documents
    /// ahead of the subtitle lines.
    async fn correct_text(&self, text: &str, config: &ReferenceConfig) -> Result<String> {
        let mut parts = Vec::new();
        for (name, content) in read_reference_documents(config) {
            parts.push(json!({
                "text": format!("[reference document {name}]\n{content}\n[end of reference document]")
            }));
        }
        parts.push(json!({ "text": text }));
        let body = json!({
            "system_instruction": { "parts": [{ "text": system_instruction(config) }] },
            "contents": [{ "parts": parts }],
        });
        let value = self.post_generate(body).await?;
        let corrected = value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("missing text in Gemini response"))?;
        Ok(corrected.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn posts_text_and_reads_corrected_lines() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-3-flash-preview:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("hello line");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "corrected line" }] }
                }]
            }));
        });

        let corrector = GeminiCorrector::with_endpoint(
            server.base_url(),
            "test-key".to_string(),
            DEFAULT_MODEL.to_string(),
        );
        let out = corrector
            .correct_text("hello line", &ReferenceConfig::default())
            .await
            .unwrap();
        assert_eq!(out, "corrected line");
        mock.assert();
    }

    #[tokio::test]
    async fn surfaces_http_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });
        let corrector = GeminiCorrector::with_endpoint(
            server.base_url(),
            "k".to_string(),
            DEFAULT_MODEL.to_string(),
        );
        let err = corrector
            .correct_text("x", &ReferenceConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn instruction_lists_characters_and_movies() {
        let config = ReferenceConfig {
            characters: vec!["Alice".into(), "Bob".into()],
            movies: vec!["Inception".into()],
            documents: vec![],
        };
        let instruction = system_instruction(&config);
        assert!(instruction.contains("Alice, Bob"));
        assert!(instruction.contains("Inception"));
        assert!(instruction.contains("same number of lines"));
    }
}
