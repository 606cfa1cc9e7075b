//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `agentline-core`, and [`create_provider`], which turns
//! the `[llm]` config section into a ready [`BoxLlmProvider`].
//!
//! [`LlmProvider`]: agentline_core::llm::provider::LlmProvider

pub mod openai;

use std::time::Duration;

use secrecy::SecretString;

use agentline_core::llm::box_provider::BoxLlmProvider;
use agentline_types::config::LlmConfig;
use agentline_types::llm::{LlmError, ModelSpec};

use self::openai::OpenAiProvider;

/// Build the provider selected by `config.model`.
///
/// # Errors
///
/// Fails when the model string names an unsupported provider or no API key
/// is available.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let spec: ModelSpec = config
        .model
        .parse()
        .map_err(|e: agentline_types::error::ConfigError| LlmError::InvalidRequest(e.to_string()))?;

    match spec.provider.as_str() {
        "openai" => {
            let api_key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let provider = OpenAiProvider::new(
                api_key,
                spec.model,
                Duration::from_secs(config.timeout_secs),
            )?
            .with_base_url(config.base_url.clone());
            tracing::info!(model = %config.model, base_url = %config.base_url, "LLM provider ready");
            Ok(BoxLlmProvider::new(provider))
        }
        other => Err(LlmError::InvalidRequest(format!(
            "unsupported model provider: '{other}'"
        ))),
    }
}

/// The bare model name to send upstream (`openai:gpt-4o` -> `gpt-4o`).
pub fn upstream_model(config: &LlmConfig) -> String {
    config
        .model
        .parse::<ModelSpec>()
        .map(|spec| spec.model)
        .unwrap_or_else(|_| config.model.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_provider() {
        let config = LlmConfig::default();
        let provider = create_provider(&config, Some(SecretString::from("sk-test"))).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_missing_api_key_is_auth_failure() {
        let config = LlmConfig::default();
        assert!(matches!(
            create_provider(&config, None),
            Err(LlmError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_unsupported_provider_rejected() {
        let config = LlmConfig {
            model: "gemini:gemini-pro".to_string(),
            ..Default::default()
        };
        let err = create_provider(&config, Some(SecretString::from("k"))).err().unwrap();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_upstream_model_strips_prefix() {
        let config = LlmConfig {
            model: "openai:gpt-4o-mini".to_string(),
            ..Default::default()
        };
        assert_eq!(upstream_model(&config), "gpt-4o-mini");
        assert_eq!(upstream_model(&LlmConfig::default()), "gpt-3.5-turbo");
    }
}
