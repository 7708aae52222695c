// src/error.rs

//! Unified error handling for the job feed.

use std::fmt;

use thiserror::Error;

/// Result type alias for job feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A listing source returned something we could not read
    #[error("Source error for {source_name}: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// Completion backend rejected the request or answered with nothing
    #[error("AI backend error: {0}")]
    Ai(String),

    /// Completion backend answered with something that is not a posting
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Outbound message could not be delivered
    #[error("Notification error: {0}")]
    Notify(String),
}

/// Why a completion response could not be turned into a structured posting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("schema violation: {0}")]
    SchemaViolation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a source error with the source name as context.
    pub fn source_error(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Create an AI backend error.
    pub fn ai(message: impl fmt::Display) -> Self {
        Self::Ai(message.to_string())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Whether this error came from the network rather than from the data.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_converts() {
        let err: AppError = ExtractionError::NoJsonObject.into();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::NoJsonObject)
        ));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_source_error_message() {
        let err = AppError::source_error("wazifaha", "missing total");
        assert_eq!(err.to_string(), "Source error for wazifaha: missing total");
    }
}
