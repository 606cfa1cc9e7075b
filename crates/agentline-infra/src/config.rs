//! Configuration loader for Agentline.
//!
//! Reads `config.toml` from the data directory (`~/.agentline/` in
//! production) into [`AgentConfig`], then overlays environment variables.
//! A missing or malformed file falls back to defaults; a malformed env value
//! is an error, since it was set on purpose.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use agentline_types::config::{AgentConfig, LogFormat, LoggingConfig};
use agentline_types::error::ConfigError;
use agentline_types::llm::ModelSpec;

/// Credentials that only ever come from the environment.
#[derive(Debug, Default)]
pub struct Secrets {
    /// Token clients must present on protected routes (`API_BEARER_TOKEN`).
    pub bearer_token: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
}

impl Secrets {
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let secret = |key: &str| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
        };
        Self {
            bearer_token: secret("API_BEARER_TOKEN"),
            openai_api_key: secret("OPENAI_API_KEY"),
        }
    }
}

/// Load `.env` from the working directory (or a parent) if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("failed to load .env: {err}"),
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`AgentConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> AgentConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AgentConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AgentConfig::default();
        }
    };

    match toml::from_str::<AgentConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AgentConfig::default()
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        })
}

fn parse_bool(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

/// Overlay environment variables on `config`.
///
/// `env` is the lookup function (`std::env::var(..).ok()` in production).
pub fn apply_env_overrides(
    config: &mut AgentConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(model) = env("AGENTLINE_MODEL") {
        config.llm.model = model;
    }
    if let Some(url) = env("OPENAI_BASE_URL") {
        config.llm.base_url = url;
    }
    if let Some(v) = env("AGENTLINE_MAX_TOKENS") {
        config.llm.max_tokens = parse_env("AGENTLINE_MAX_TOKENS", v)?;
    }
    if let Some(v) = env("AGENTLINE_HISTORY_LIMIT") {
        config.llm.history_limit = parse_env("AGENTLINE_HISTORY_LIMIT", v)?;
    }
    if let Some(host) = env("AGENTLINE_HOST") {
        config.server.host = host;
    }
    if let Some(v) = env("AGENTLINE_PORT") {
        config.server.port = parse_env("AGENTLINE_PORT", v)?;
    }
    if let Some(v) = env("MEMORY_SHORT_TERM_SIZE") {
        config.memory.short_term_size = parse_env("MEMORY_SHORT_TERM_SIZE", v)?;
    }
    if let Some(v) = env("MEMORY_MAX_SESSIONS") {
        config.memory.max_sessions = parse_env("MEMORY_MAX_SESSIONS", v)?;
    }
    if let Some(dir) = env("MEMORY_PERSISTENCE_DIR") {
        config.memory.persistence_dir = Some(PathBuf::from(dir));
    }
    if let Some(v) = env("AGENTLINE_MEMORY_PERSIST") {
        config.memory.persistence_enabled = parse_bool("AGENTLINE_MEMORY_PERSIST", v)?;
    }

    // Fail at startup rather than on the first request.
    config.llm.model.parse::<ModelSpec>()?;
    Ok(())
}

/// Logging settings from the environment.
///
/// Read before `config.toml` so that problems with the file are logged.
pub fn logging_from_env(
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoggingConfig, ConfigError> {
    let mut logging = LoggingConfig::default();
    if let Some(v) = env("AGENTLINE_LOG_FORMAT") {
        logging.format = v
            .parse::<LogFormat>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "AGENTLINE_LOG_FORMAT".to_string(),
                value: v,
            })?;
    }
    if let Some(level) = env("AGENTLINE_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
        logging.level = Some(level);
    }
    if let Some(v) = env("AGENTLINE_OTEL") {
        logging.otel = parse_bool("AGENTLINE_OTEL", v)?;
    }
    Ok(logging)
}

/// Where the short-term memory snapshot lives.
pub fn memory_dir(config: &AgentConfig, data_dir: &Path) -> PathBuf {
    config
        .memory
        .persistence_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("memory_data"))
}

/// File config plus process environment.
pub async fn resolve_config(data_dir: &Path) -> Result<AgentConfig, ConfigError> {
    let mut config = load_config(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.llm.model, "openai:gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 9000

[llm]
model = "openai:gpt-4o-mini"
history_limit = 4

[memory]
short_term_size = 20
persistence_enabled = false
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.model, "openai:gpt-4o-mini");
        assert_eq!(config.llm.history_limit, 4);
        assert_eq!(config.memory.short_term_size, 20);
        assert!(!config.memory.persistence_enabled);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is [not valid toml")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.server.port, 8001);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AgentConfig::default();
        apply_env_overrides(
            &mut config,
            env_of(&[
                ("AGENTLINE_MODEL", "openai:gpt-4o"),
                ("AGENTLINE_PORT", "8080"),
                ("MEMORY_SHORT_TERM_SIZE", "25"),
                ("MEMORY_MAX_SESSIONS", "40"),
                ("MEMORY_PERSISTENCE_DIR", "/var/lib/agentline/mem"),
                ("AGENTLINE_MEMORY_PERSIST", "off"),
                ("AGENTLINE_HISTORY_LIMIT", "6"),
            ]),
        )
        .unwrap();

        assert_eq!(config.llm.model, "openai:gpt-4o");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.memory.short_term_size, 25);
        assert_eq!(config.memory.max_sessions, 40);
        assert_eq!(
            config.memory.persistence_dir,
            Some(PathBuf::from("/var/lib/agentline/mem"))
        );
        assert!(!config.memory.persistence_enabled);
        assert_eq!(config.llm.history_limit, 6);
    }

    #[test]
    fn logging_reads_env() {
        let logging = logging_from_env(env_of(&[
            ("AGENTLINE_LOG_FORMAT", "json"),
            ("AGENTLINE_LOG_LEVEL", "agentline=debug"),
            ("AGENTLINE_OTEL", "true"),
        ]))
        .unwrap();
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.level.as_deref(), Some("agentline=debug"));
        assert!(logging.otel);

        let defaults = logging_from_env(env_of(&[])).unwrap();
        assert_eq!(defaults.format, LogFormat::Pretty);
        assert!(defaults.level.is_none());
    }

    #[test]
    fn bad_log_format_is_an_error() {
        let err = logging_from_env(env_of(&[("AGENTLINE_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "AGENTLINE_LOG_FORMAT"));
    }

    #[test]
    fn bare_model_name_is_accepted() {
        let mut config = AgentConfig::default();
        apply_env_overrides(&mut config, env_of(&[("AGENTLINE_MODEL", "gpt-4o-mini")])).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_env_value_is_an_error() {
        let mut config = AgentConfig::default();
        let err = apply_env_overrides(&mut config, env_of(&[("AGENTLINE_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "AGENTLINE_PORT"));
    }

    #[test]
    fn unsupported_model_provider_is_an_error() {
        let mut config = AgentConfig::default();
        let err = apply_env_overrides(&mut config, env_of(&[("AGENTLINE_MODEL", "groq:llama3")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(p) if p == "groq"));
    }

    #[test]
    fn secrets_come_from_env_only() {
        let secrets = Secrets::from_env(env_of(&[
            ("API_BEARER_TOKEN", "tok-123"),
            ("OPENAI_API_KEY", "  "),
        ]));
        assert_eq!(secrets.bearer_token.unwrap().expose_secret(), "tok-123");
        assert!(secrets.openai_api_key.is_none());
    }

    #[test]
    fn memory_dir_defaults_under_data_dir() {
        let config = AgentConfig::default();
        assert_eq!(
            memory_dir(&config, Path::new("/data")),
            PathBuf::from("/data/memory_data")
        );
    }
}
