//! HTTP chat-completion client for both provider families.

use super::{ChatClient, ChatMessage, ChatRequest, HttpConfig};
use crate::config::{ModelConfig, Provider};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A chat-completion client bound to one configured model's endpoint.
///
/// Both provider families speak the OpenAI-compatible `chat/completions`
/// surface; the anthropic family additionally requires a versioned base
/// path and a version header, attached here at construction.
pub struct HttpChatClient {
    /// Normalized API endpoint.
    endpoint: String,
    /// API key, sent as a bearer token.
    api_key: String,
    /// Provider family.
    provider: Provider,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl HttpChatClient {
    /// Version header value for the anthropic-compatible family.
    pub const ANTHROPIC_VERSION: &'static str = "2023-06-01";

    /// Versioned path segment the anthropic-compatible base URL must end with.
    const ANTHROPIC_PATH: &'static str = "/v1";

    /// Builds a client for the given model with env-configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientConstructionFailed`] when the underlying HTTP
    /// client cannot be built.
    pub fn for_model(config: &ModelConfig) -> Result<Self> {
        Self::with_http_config(config, HttpConfig::from_env())
    }

    /// Builds a client for the given model with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientConstructionFailed`] when the underlying HTTP
    /// client cannot be built.
    pub fn with_http_config(config: &ModelConfig, http: HttpConfig) -> Result<Self> {
        let endpoint = Self::normalized_endpoint(config);
        let mut builder = http.apply(reqwest::blocking::Client::builder());

        if config.provider == Provider::Anthropic {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                "anthropic-version",
                reqwest::header::HeaderValue::from_static(Self::ANTHROPIC_VERSION),
            );
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|e| Error::ClientConstructionFailed {
                cause: e.to_string(),
            })?;

        tracing::debug!(
            provider = %config.provider,
            endpoint = %endpoint,
            "constructed provider client"
        );

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            provider: config.provider,
            client,
        })
    }

    /// The endpoint requests are issued against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Normalizes the configured base URL for the provider family.
    fn normalized_endpoint(config: &ModelConfig) -> String {
        match config.provider {
            Provider::Anthropic => {
                let base = config.base_url.trim_end_matches('/');
                if base.ends_with(Self::ANTHROPIC_PATH) {
                    base.to_string()
                } else {
                    format!("{base}{}", Self::ANTHROPIC_PATH)
                }
            },
            Provider::OpenAi => config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ChatClient for HttpChatClient {
    fn name(&self) -> &'static str {
        match self.provider {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    fn chat(&self, request: &ChatRequest) -> Result<Option<String>> {
        tracing::info!(
            provider = self.name(),
            model = %request.model,
            messages = request.messages.len(),
            "dispatching chat completion"
        );

        let payload = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else if e.is_request() {
                    "request"
                } else {
                    "unknown"
                };
                tracing::error!(
                    provider = self.name(),
                    model = %request.model,
                    error = %e,
                    error_kind = error_kind,
                    "chat completion request failed"
                );
                Error::EnhancementDispatchFailed {
                    cause: format!("{error_kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = self.name(),
                status = %status,
                body = %body,
                "provider returned error status"
            );
            return Err(Error::EnhancementDispatchFailed {
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .map_err(|e| Error::EnhancementDispatchFailed {
                    cause: format!("failed to parse provider response: {e}"),
                })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

/// Request body for the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// Response body from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

/// The message of a choice; content may be absent.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
