use async_trait::async_trait;
use quarry_core::config::ENV_GEMINI_API_KEY;
use quarry_core::{AnswerGenerator, Error, GenerationConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Gemini API base URL.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API provider.
pub struct GeminiGenerator {
    /// HTTP client for API requests.
    client: Client,
    /// Gemini API key.
    api_key: String,
    /// Model name to use.
    model: String,
    /// Instructions placed before the context.
    system_prompt: String,
}

impl GeminiGenerator {
    /// Creates a new `GeminiGenerator` from generation settings.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if no API key is configured.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::MissingApiKey(ENV_GEMINI_API_KEY.to_owned()))?;

        Ok(Self {
            client: Client::default(),
            api_key,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// Endpoint for the configured model.
    fn endpoint(&self) -> String {
        format!("{GEMINI_API_URL}/{}:generateContent", self.model)
    }
}

/// Single-turn prompt combining instructions, context and question.
fn build_prompt(system_prompt: &str, context: &str, question: &str) -> String {
    format!("{system_prompt}\n\nContext:\n{context}\n\nQuestion:\n{question}\n")
}

/// Request payload sent to `generateContent`.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    /// Conversation turns.
    contents: Vec<GeminiContent>,
}

/// One conversation turn.
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    /// Author role (`user` or `model`).
    #[serde(default)]
    role: String,
    /// Content parts of the turn.
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Text part of a turn.
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    /// Text content.
    #[serde(default)]
    text: String,
}

/// Response payload returned by Gemini.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    /// Candidate completions.
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// A single candidate completion.
#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    /// Generated turn, absent when the candidate was blocked.
    content: Option<GeminiContent>,
    /// Why generation stopped.
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

/// Concatenated text of the first candidate.
fn extract_text(response: GeminiResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("No response from Gemini".to_owned()))?;

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::Provider(format!(
            "Gemini returned no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        let start = Instant::now();
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_owned(),
                parts: vec![GeminiPart {
                    text: build_prompt(&self.system_prompt, context, question),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| Error::Provider(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Provider(format!(
                "Gemini API error {status}: {error_text}"
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|err| Error::Provider(format!("Failed to parse Gemini response: {err}")))?;

        debug!("Gemini answered in {} ms", start.elapsed().as_millis());
        extract_text(gemini_response)
    }
}
