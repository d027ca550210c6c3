mod gemini;
mod openai;

use crate::types::{ApiKey, Provider};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

pub use gemini::GEMINI_MODEL;
pub use openai::{OPENAI_MODEL, TURING_SYSTEM_PROMPT};

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Sampling parameters shared by both providers
pub const TEMPERATURE: f64 = 0.7;
pub const TOP_P: f64 = 0.9;
pub const MAX_OUTPUT_TOKENS: u32 = 150;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Errors that can occur while fetching an AI answer.
///
/// Every variant is fatal to the session that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error reaching {provider}: {message}")]
    Transport { provider: Provider, message: String },

    #[error("{provider} API returned status {status}: {message}")]
    HttpStatus {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("Failed to decode {provider} response: {message}")]
    MalformedResponse { provider: Provider, message: String },

    #[error("Error generating {provider} response: {message}")]
    ProviderApi { provider: Provider, message: String },
}

impl LlmError {
    pub fn provider(&self) -> Provider {
        match self {
            LlmError::Transport { provider, .. }
            | LlmError::HttpStatus { provider, .. }
            | LlmError::MalformedResponse { provider, .. }
            | LlmError::ProviderApi { provider, .. } => *provider,
        }
    }
}

/// Source of AI-written answers
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Ask `provider` to answer `prompt`, authenticating with `api_key`.
    /// Exactly one request per call.
    async fn fetch_answer(
        &self,
        prompt: &str,
        api_key: &ApiKey,
        provider: Provider,
    ) -> LlmResult<String>;
}

/// Model identifier used for a provider
pub fn model_for(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => GEMINI_MODEL,
        Provider::OpenAi => OPENAI_MODEL,
    }
}

/// Endpoint configuration for the providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL for the Gemini API (no trailing path)
    pub gemini_base_url: String,
    /// Base URL for the OpenAI API (no trailing path)
    pub openai_base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let gemini_base_url = non_empty_env("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        let openai_base_url = non_empty_env("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

        Self {
            gemini_base_url,
            openai_base_url,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim().trim_end_matches('/');
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// `AnswerProvider` backed by the real provider HTTP APIs
pub struct HttpAnswerProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpAnswerProvider {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl AnswerProvider for HttpAnswerProvider {
    async fn fetch_answer(
        &self,
        prompt: &str,
        api_key: &ApiKey,
        provider: Provider,
    ) -> LlmResult<String> {
        let start = Instant::now();

        let result = match provider {
            Provider::Gemini => {
                gemini::generate(&self.client, &self.config.gemini_base_url, prompt, api_key).await
            }
            Provider::OpenAi => {
                openai::generate(&self.client, &self.config.openai_base_url, prompt, api_key).await
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::info!(
                "{} answered in {}ms ({} chars)",
                provider,
                latency_ms,
                text.len()
            ),
            Err(e) => tracing::error!("{} request failed after {}ms: {}", provider, latency_ms, e),
        }

        result
    }
}

/// `{"error": {"message": ...}}` envelope used by both providers
#[derive(Debug, Default, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Pull the provider's error message out of a response body, if it has one
fn error_message_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
}

/// Send a prepared request and return the raw body of a 2xx response
async fn send(request: reqwest::RequestBuilder, provider: Provider) -> LlmResult<String> {
    // The request URL can carry the API key as a query parameter
    let response = request.send().await.map_err(|e| LlmError::Transport {
        provider,
        message: e.without_url().to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| LlmError::Transport {
        provider,
        message: format!("failed to read response body: {}", e.without_url()),
    })?;

    if !status.is_success() {
        let message = error_message_from_body(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        return Err(LlmError::HttpStatus {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

/// Decode a success body into the provider's response envelope
fn decode<T: serde::de::DeserializeOwned>(body: &str, provider: Provider) -> LlmResult<T> {
    serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse {
        provider,
        message: e.to_string(),
    })
}

/// Default message when the provider gives no answer and no explanation
fn unknown_api_error(provider: Provider) -> String {
    format!("Unknown API error from {}", provider)
}
