/// LLM client: the single point of entry for all generation calls in the interview API.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// All LLM interactions MUST go through `LlmBackend`.
///
/// Model: gemini-2.0-flash (hardcoded, not configurable).
/// Audio answers are sent inline with the prompt.
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::data_uri::DataUri;

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.0-flash";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Output parsed as JSON but did not match the declared shape.
    #[error("Output failed schema validation: {0}")]
    Schema(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One prompt execution: a system instruction, a user prompt, and optional inline media.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub media: Option<&'a DataUri>,
}

impl<'a> PromptRequest<'a> {
    pub fn text(system: &'a str, prompt: &'a str) -> Self {
        Self {
            system,
            prompt,
            media: None,
        }
    }

    pub fn with_media(mut self, media: &'a DataUri) -> Self {
        self.media = Some(media);
        self
    }
}

/// The generation backend. `LlmClient` is the production implementation;
/// tests swap in a scripted one.
///
/// Carried in `AppState` as `Arc<dyn LlmBackend>`.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Executes the prompt and returns the raw text of the first candidate.
    async fn generate(&self, request: PromptRequest<'_>) -> Result<String, LlmError>;
}

/// Calls the backend and deserializes the text response as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn call_json<T: DeserializeOwned>(
    llm: &dyn LlmBackend,
    request: PromptRequest<'_>,
) -> Result<T, LlmError> {
    let text = llm.generate(request).await?;

    // Strip markdown code fences if the model wraps JSON in them
    let text = strip_json_fences(&text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    let value: serde_json::Value = serde_json::from_str(text)?;
    serde_json::from_value(value).map_err(|e| LlmError::Schema(e.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The production LLM client.
/// Wraps the Gemini `generateContent` API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
        })
    }

    /// Makes a raw call to the provider, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, request: PromptRequest<'_>) -> Result<LlmResponse, LlmError> {
        let mut parts = vec![Part::Text {
            text: request.prompt,
        }];
        if let Some(media) = request.media {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: media.mime_type(),
                    data: media.payload(),
                },
            });
        }

        let request_body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: request.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!("{GEMINI_API_BASE}/{MODEL}:generateContent");
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}, media={}",
                    usage.prompt_token_count,
                    usage.candidates_token_count,
                    request.media.is_some()
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl LlmBackend for LlmClient {
    async fn generate(&self, request: PromptRequest<'_>) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        response.text().ok_or(LlmError::EmptyContent)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Scripted backend for tests: replies are keyed by system prompt.
#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::Semaphore;

    use super::*;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Text(String),
        Fail { status: u16, message: String },
    }

    #[derive(Default)]
    pub struct ScriptedLlm {
        replies: Mutex<HashMap<String, Reply>>,
        gates: Mutex<HashMap<String, Arc<Semaphore>>>,
        calls: AtomicUsize,
        media_calls: AtomicUsize,
    }

    impl ScriptedLlm {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, system: &str, body: serde_json::Value) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(system.to_string(), Reply::Text(body.to_string()));
            self
        }

        pub fn reply_raw(self, system: &str, text: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(system.to_string(), Reply::Text(text.to_string()));
            self
        }

        pub fn fail(self, system: &str, status: u16) -> Self {
            self.replies.lock().unwrap().insert(
                system.to_string(),
                Reply::Fail {
                    status,
                    message: "scripted failure".to_string(),
                },
            );
            self
        }

        /// Calls for `system` wait for a permit on `gate` before replying.
        pub fn hold(self, system: &str, gate: Arc<Semaphore>) -> Self {
            self.gates
                .lock()
                .unwrap()
                .insert(system.to_string(), gate);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn media_calls(&self) -> usize {
            self.media_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedLlm {
        async fn generate(&self, request: PromptRequest<'_>) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.media.is_some() {
                self.media_calls.fetch_add(1, Ordering::SeqCst);
            }
            let gate = self.gates.lock().unwrap().get(request.system).cloned();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            let reply = self.replies.lock().unwrap().get(request.system).cloned();
            match reply {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::Fail { status, message }) => Err(LlmError::Api { status, message }),
                None => Err(LlmError::EmptyContent),
            }
        }
    }
}
