//! Error types for the Clausewise core.
//!
//! Uses `thiserror` for public API error types with one enum per domain
//! (rules, retrieval, generation, configuration), aggregated into
//! [`ClausewiseError`].

use std::path::PathBuf;

/// Top-level error type for the Clausewise core library.
#[derive(Debug, thiserror::Error)]
pub enum ClausewiseError {
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading or querying the rule registry.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("Rule not found: {id}")]
    NotFound { id: String },

    #[error("Malformed rule source: {message}")]
    Malformed { message: String },

    #[error("Failed to read rule source {path}: {message}")]
    Unreadable { path: PathBuf, message: String },
}

/// Errors from the document index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Document index unavailable: {message}")]
    Unavailable { message: String },
}

impl IndexError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Errors reported by a generation backend.
///
/// The orchestrator never inspects the variant; it is carried through to the
/// caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider {provider}")]
    RateLimited { provider: String },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// A type alias for results using the top-level `ClausewiseError`.
pub type Result<T> = std::result::Result<T, ClausewiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_rule() {
        let err = ClausewiseError::Rule(RuleError::InvalidRule {
            id: "R7".into(),
            reason: "unknown severity 'URGENT'".into(),
        });
        assert_eq!(
            err.to_string(),
            "Rule error: Invalid rule 'R7': unknown severity 'URGENT'"
        );
    }

    #[test]
    fn test_error_display_not_found() {
        let err = RuleError::NotFound { id: "R99".into() };
        assert_eq!(err.to_string(), "Rule not found: R99");
    }

    #[test]
    fn test_error_display_index() {
        let err = ClausewiseError::Index(IndexError::unavailable("missing index.json"));
        assert_eq!(
            err.to_string(),
            "Index error: Document index unavailable: missing index.json"
        );
    }

    #[test]
    fn test_error_display_generation() {
        let err = ClausewiseError::Generation(GenerationError::AuthFailed {
            provider: "Gemini".into(),
        });
        assert_eq!(
            err.to_string(),
            "Generation error: Authentication failed for provider Gemini"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = ClausewiseError::Config(ConfigError::FileNotFound {
            path: PathBuf::from("data/compliance_rules.json"),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Configuration file not found: data/compliance_rules.json"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ClausewiseError = io_err.into();
        assert!(matches!(err, ClausewiseError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ClausewiseError = serde_err.into();
        assert!(matches!(err, ClausewiseError::Serialization(_)));
    }
}
