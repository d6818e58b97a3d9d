//! Chat-completions API interaction: connectivity probe and article generation.
//!
//! # Architecture
//!
//! - [`ChatBackend`]: the two calls the pipeline makes against the generation backend
//! - [`ChatClient`]: `reqwest` implementation for any OpenAI-compatible endpoint
//! - [`ResponseShape`]: named strategies for finding generated text in a response
//!
//! There is no retry: one failed call ends the run.

use crate::config::GenerationSettings;
use crate::error::{BotError, Result};
use crate::models::{ChatMessage, ChatRequest};
use crate::utils::truncate_for_log;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

const SERVICE: &str = "generation";
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATION_TIMEOUT: Duration = Duration::from_secs(180);
const PROBE_PROMPT: &str = "Test connection.";
const PROBE_MAX_TOKENS: u32 = 8;

/// The generation backend as seen by the pipeline.
pub trait ChatBackend {
    /// Cheap authenticated call made before any real work.
    async fn probe(&self) -> Result<()>;

    /// Send `prompt` as a single user message and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Where generated text may live in a response body.
///
/// Strategies are tried in [`ResponseShape::PRIORITY`] order; the first one
/// that yields a string wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `choices[0].message.content`
    ChatMessage,
    /// `choices[0].text`
    TextCompletion,
}

impl ResponseShape {
    pub const PRIORITY: [ResponseShape; 2] =
        [ResponseShape::ChatMessage, ResponseShape::TextCompletion];

    pub fn extract(self, body: &Value) -> Option<&str> {
        let first = body.get("choices")?.get(0)?;
        match self {
            ResponseShape::ChatMessage => first.get("message")?.get("content")?.as_str(),
            ResponseShape::TextCompletion => first.get("text")?.as_str(),
        }
    }
}

/// Run every strategy in priority order and return the first match, trimmed.
pub fn extract_completion(body: &Value) -> Option<(ResponseShape, String)> {
    ResponseShape::PRIORITY
        .iter()
        .find_map(|shape| shape.extract(body).map(|text| (*shape, text.trim().to_string())))
}

fn has_choices(body: &Value) -> bool {
    body.get("choices")
        .and_then(Value::as_array)
        .is_some_and(|c| !c.is_empty())
}

/// Classify the probe response.
///
/// Returns whether the body carried a non-empty `choices` list; a success
/// without one is still a success.
pub fn classify_probe(status: u16, body: &str) -> Result<bool> {
    match status {
        200..=299 => Ok(serde_json::from_str::<Value>(body)
            .map(|v| has_choices(&v))
            .unwrap_or(false)),
        401 | 403 => Err(BotError::Auth {
            service: SERVICE,
            status,
        }),
        _ => Err(BotError::UnexpectedStatus {
            service: SERVICE,
            status,
            body: truncate_for_log(body, 500),
        }),
    }
}

/// Decode a generation response into article text.
pub fn interpret_generation(status: u16, body: &str) -> Result<String> {
    match status {
        200..=299 => {}
        401 | 403 => {
            return Err(BotError::Auth {
                service: SERVICE,
                status,
            });
        }
        _ => {
            return Err(BotError::UnexpectedStatus {
                service: SERVICE,
                status,
                body: truncate_for_log(body, 500),
            });
        }
    }

    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        BotError::malformed(SERVICE, format!("invalid JSON ({e}): {}", truncate_for_log(body, 300)))
    })?;

    match extract_completion(&parsed) {
        Some((shape, text)) => {
            debug!(?shape, bytes = text.len(), "Extracted generated text");
            Ok(text)
        }
        None => Err(BotError::malformed(
            SERVICE,
            format!(
                "no chat-completions text found; full response: {}",
                truncate_for_log(body, 300)
            ),
        )),
    }
}

/// `reqwest` client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    settings: GenerationSettings,
    api_key: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.settings.endpoint)
            .field("model", &self.settings.model)
            .finish()
    }
}

impl ChatClient {
    pub fn new(settings: GenerationSettings, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BotError::transport(SERVICE, e))?;
        Ok(Self {
            http,
            settings,
            api_key,
        })
    }

    fn probe_request(&self) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::user(PROBE_PROMPT)],
            temperature: None,
            max_tokens: Some(PROBE_MAX_TOKENS),
        }
    }

    fn generation_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        }
    }

    /// POST `body` and return status and raw text.
    async fn post(&self, body: &ChatRequest, timeout: Duration) -> Result<(u16, String)> {
        let resp = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| BotError::transport(SERVICE, e))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| BotError::transport(SERVICE, e))?;
        Ok((status, text))
    }
}

impl ChatBackend for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.settings.model, endpoint = %self.settings.endpoint))]
    async fn probe(&self) -> Result<()> {
        info!("Testing generation backend authentication");
        let (status, body) = self.post(&self.probe_request(), PROBE_TIMEOUT).await?;
        info!(status, "Auth test status");

        match classify_probe(status, &body) {
            Ok(true) => {
                info!("Authentication successful; model response contains 'choices'");
                Ok(())
            }
            Ok(false) => {
                warn!("Authentication successful but the response has no 'choices'");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Generation backend probe failed");
                Err(e)
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let t0 = Instant::now();
        info!(
            prompt_bytes = prompt.len(),
            max_tokens = self.settings.max_tokens,
            "Generating article"
        );
        let (status, body) = self
            .post(&self.generation_request(prompt), GENERATION_TIMEOUT)
            .await?;
        let dt = t0.elapsed();

        match interpret_generation(status, &body) {
            Ok(text) => {
                info!(
                    status,
                    elapsed_ms = dt.as_millis() as u64,
                    bytes = text.len(),
                    "Article generated"
                );
                Ok(text)
            }
            Err(e) => {
                error!(status, elapsed_ms = dt.as_millis() as u64, error = %e, "Article generation failed");
                Err(e)
            }
        }
    }
}
