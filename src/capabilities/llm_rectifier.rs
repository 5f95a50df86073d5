//! HTTP client for the OpenAI-compatible rectification backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompts::{rectify_user_message, RECTIFY_SYSTEM_PROMPT};
use super::{Rectifier, RectifierFactory, RectifierOptions};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{Chunk, RectifiedChunk, ServiceConfig};

/// Sampling temperature; corrections should stay close to the source.
const TEMPERATURE: f32 = 0.1;

/// Chat completion request payload.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response payload.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Rectifier backed by a `/chat/completions` endpoint.
pub struct LlmRectifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    verbose: bool,
}

impl LlmRectifier {
    fn build_request(&self, chunk: &Chunk) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: RECTIFY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: rectify_user_message(chunk.index, &chunk.content),
                },
            ],
            temperature: TEMPERATURE,
        }
    }
}

/// Pull the corrected text out of a completion response.
fn extract_reply(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| anyhow!("completion returned no choices"))
}

#[async_trait]
impl Rectifier for LlmRectifier {
    fn name(&self) -> &str {
        &self.model
    }

    async fn rectify_chunk(&self, chunk: &Chunk) -> Result<RectifiedChunk> {
        let started = Instant::now();
        let request = self.build_request(chunk);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("model backend returned {}: {}", status, text));
        }

        let reply = extract_reply(response.json::<ChatResponse>().await?)?;

        if self.verbose {
            info!(
                chunk = chunk.index,
                model = %self.model,
                input_chars = chunk.content.len(),
                output_chars = reply.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chunk rectified"
            );
        } else {
            debug!(chunk = chunk.index, output_chars = reply.len(), "Chunk rectified");
        }

        Ok(RectifiedChunk::new(chunk.index, reply))
    }
}

/// Builds one [`LlmRectifier`] per request around a shared HTTP client.
///
/// The connection pool is created once at start-up; rectifiers are cheap
/// handles that only carry the per-request model and verbosity.
pub struct LlmRectifierFactory {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LlmRectifierFactory {
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.llm_base_url.trim_end_matches('/')
            ),
            api_key: config.llm_api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RectifierFactory for LlmRectifierFactory {
    fn create(&self, options: RectifierOptions) -> ServiceResult<Arc<dyn Rectifier>> {
        let model = options.model.trim();
        if model.is_empty() {
            return Err(ServiceError::Configuration(
                "model must not be blank".into(),
            ));
        }

        Ok(Arc::new(LlmRectifier {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
            verbose: options.verbose,
        }))
    }
}
