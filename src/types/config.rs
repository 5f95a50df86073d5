//! Service configuration.

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_BODY_BYTES, DEFAULT_MODEL, DEFAULT_STREAM_BUFFER};

/// Global rectification service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Model used when a request does not name one
    pub default_model: String,

    /// Chunk size in characters used when a request does not set one
    pub default_chunk_size: usize,

    /// Base URL of the OpenAI-compatible completion endpoint
    pub llm_base_url: String,

    /// Bearer token for the completion endpoint
    #[serde(default, skip_serializing)]
    pub llm_api_key: Option<String>,

    /// Per-call deadline owned by the rectification capability
    pub llm_timeout_secs: u64,

    /// Frames buffered between a producer and a slow consumer
    pub stream_buffer: usize,

    /// Largest accepted request body
    pub max_body_bytes: usize,

    /// Emit per-chunk diagnostics from the rectifier
    pub verbose: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3017,
            default_model: DEFAULT_MODEL.to_string(),
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            llm_timeout_secs: 120,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            verbose: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from defaults overridden by `RECTIFIER_*` variables.
    pub fn from_env() -> ServiceResult<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("host", defaults.host)
            .and_then(|b| b.set_default("port", i64::from(defaults.port)))
            .and_then(|b| b.set_default("default_model", defaults.default_model))
            .and_then(|b| b.set_default("default_chunk_size", defaults.default_chunk_size as i64))
            .and_then(|b| b.set_default("llm_base_url", defaults.llm_base_url))
            .and_then(|b| b.set_default("llm_timeout_secs", defaults.llm_timeout_secs as i64))
            .and_then(|b| b.set_default("stream_buffer", defaults.stream_buffer as i64))
            .and_then(|b| b.set_default("max_body_bytes", defaults.max_body_bytes as i64))
            .and_then(|b| b.set_default("verbose", defaults.verbose))
            .map_err(|e| ServiceError::Configuration(e.to_string()))?
            .add_source(Environment::with_prefix("RECTIFIER").try_parsing(true))
            .build()
            .map_err(|e| ServiceError::Configuration(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| ServiceError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.default_chunk_size == 0 {
            return Err(ServiceError::Configuration(
                "default chunk size must be greater than zero".into(),
            ));
        }
        if self.stream_buffer == 0 {
            return Err(ServiceError::Configuration(
                "stream buffer must hold at least one frame".into(),
            ));
        }
        if self.default_model.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "default model must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
