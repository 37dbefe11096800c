//! Custom error types for translation operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Source text was empty or whitespace only
    #[error("Source text is empty")]
    EmptyText,

    /// Temperature outside of the accepted sampling range
    #[error("Temperature {value} is outside the range 0.1-1.0")]
    InvalidTemperature {
        value: f32,
    },

    /// Requested model is not in the registry
    #[error("Model not found: {model}")]
    ModelNotFound {
        model: String,
    },

    /// Template placeholder without a supplied field
    #[error("Missing required field: {field}")]
    MissingField {
        field: String,
    },

    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {after_ms} ms")]
    TimeoutError {
        after_ms: u64,
    },

    /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Coarse error category exposed to callers of the translation client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad user input (empty text, temperature out of range)
    Validation,
    /// Unknown model or broken template/config
    Configuration,
    /// Transport or backend failure during generation
    Backend,
    /// Cancelled by the caller before the backend answered
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Backend => write!(f, "backend"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Prefix of every message produced for a failed backend round trip
pub const TRANSLATION_ERROR_PREFIX: &str = "translation error";

impl TranslationError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslationError::EmptyText | TranslationError::InvalidTemperature { .. } => {
                ErrorKind::Validation
            }
            TranslationError::ModelNotFound { .. }
            | TranslationError::MissingField { .. }
            | TranslationError::ConfigError { .. } => ErrorKind::Configuration,
            TranslationError::Cancelled => ErrorKind::Cancelled,
            TranslationError::ApiError { .. }
            | TranslationError::NetworkError { .. }
            | TranslationError::InvalidResponseError { .. }
            | TranslationError::TimeoutError { .. }
            | TranslationError::HttpError(_) => ErrorKind::Backend,
        }
    }

    /// Text shown to the user in place of a translation
    pub fn user_message(&self) -> String {
        match self {
            TranslationError::EmptyText => "Please enter text to translate.".to_string(),
            TranslationError::ModelNotFound { model } => {
                format!("Error: model not found: {}", model)
            }
            TranslationError::InvalidTemperature { .. } => format!("Error: {}", self),
            TranslationError::Cancelled => "Translation cancelled.".to_string(),
            other => format!("{}: {}", TRANSLATION_ERROR_PREFIX, other),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_errors_have_fixed_messages() {
        assert_eq!(
            TranslationError::EmptyText.user_message(),
            "Please enter text to translate."
        );
        let missing = TranslationError::ModelNotFound {
            model: "Claude".to_string(),
        };
        assert_eq!(missing.user_message(), "Error: model not found: Claude");
        assert_eq!(missing.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_backend_errors_use_prefix() {
        let err = TranslationError::NetworkError {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.user_message().starts_with(TRANSLATION_ERROR_PREFIX));
        assert!(err.user_message().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_http_client_error_is_backend() {
        let err: TranslationError = reqwest::get("not a url").await.unwrap_err().into();
        assert!(matches!(err, TranslationError::HttpError(_)));
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Configuration).unwrap();
        assert_eq!(json, "\"configuration\"");
    }
}
