//! OpenAiProvider -- concrete [`LlmProvider`] for chat-completions endpoints.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use agentline_core::llm::provider::LlmProvider;
use agentline_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
};

use super::types::{ChatMessage, ChatRequest, ChatResponse, ErrorEnvelope, ResponseFormat};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completions provider.
///
/// Intentionally not `Debug`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    capabilities: ProviderCapabilities,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let capabilities = Self::capabilities_for_model(&model);

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            capabilities,
        })
    }

    /// Point at a different OpenAI-compatible endpoint. A trailing slash is
    /// ignored.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn capabilities_for_model(model: &str) -> ProviderCapabilities {
        if model.starts_with("gpt-4o") || model.starts_with("gpt-4.1") {
            ProviderCapabilities {
                json_output: true,
                max_context_tokens: 128_000,
                max_output_tokens: 16_384,
            }
        } else if model.starts_with("gpt-3.5-turbo") {
            ProviderCapabilities {
                json_output: true,
                max_context_tokens: 16_385,
                max_output_tokens: 4_096,
            }
        } else {
            // Unknown models may not accept response_format.
            ProviderCapabilities {
                json_output: false,
                max_context_tokens: 8_192,
                max_output_tokens: 4_096,
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into the wire request. The
    /// system prompt becomes the first message.
    fn to_chat_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        ChatRequest {
            model,
            messages,
            max_tokens: request.max_tokens.min(self.capabilities.max_output_tokens),
            temperature: request.temperature,
            response_format: (request.json_output && self.capabilities.json_output)
                .then(ResponseFormat::json_object),
        }
    }
}

/// Map a non-2xx status and body to an [`LlmError`].
fn error_for_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> LlmError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .unwrap_or_else(|| body.to_string());
    let code = envelope.and_then(|e| e.error.code);

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs * 1000),
        },
        400 if code.as_deref() == Some("context_length_exceeded") => {
            LlmError::ContextLengthExceeded(message)
        }
        400 | 404 | 422 => LlmError::InvalidRequest(message),
        500 | 502 | 503 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Take the first choice's text. A missing choice or null content is a
/// deserialization failure rather than an empty reply.
fn into_completion(response: ChatResponse) -> Result<CompletionResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Deserialization("response contained no choices".to_string()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| LlmError::Deserialization("response message had no content".to_string()))?;

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFilter,
        Some("stop") | None => StopReason::EndTurn,
        Some(_) => StopReason::StopSequence,
    };

    let usage = response.usage.unwrap_or_default();
    Ok(CompletionResponse {
        id: response.id,
        content,
        model: response.model,
        stop_reason,
        usage: Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    })
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_chat_request(request);
        let url = self.url("/chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &error_body, retry_after));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        tracing::debug!(model = %chat.model, "chat completion received");
        into_completion(chat)
    }
}
