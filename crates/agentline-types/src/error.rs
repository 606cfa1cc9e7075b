use thiserror::Error;

/// Errors from repository operations (used by trait definitions in agentline-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from short-term memory persistence.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory persistence io error: {0}")]
    Io(String),

    #[error("memory snapshot is corrupt: {0}")]
    Corrupt(String),
}

/// Errors raised while assembling runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("unsupported model provider: '{0}'")]
    UnsupportedProvider(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "MEMORY_SHORT_TERM_SIZE".to_string(),
            value: "ten".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for MEMORY_SHORT_TERM_SIZE: 'ten'"
        );
    }

    #[test]
    fn test_memory_error_display() {
        let err = MemoryError::Corrupt("expected value at line 1".to_string());
        assert!(err.to_string().starts_with("memory snapshot is corrupt"));
    }
}
