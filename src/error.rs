//! Error types for resultshaper.
//!
//! Every variant is a local, recoverable condition. Callers turn them into a
//! user-visible message with [`ShapeError::user_message`] instead of letting
//! them reach the UI shell.

use std::time::Duration;
use thiserror::Error;

/// Main error type for shaping and upstream query operations.
#[derive(Error, Debug)]
pub enum ShapeError {
    /// The result lacks `metadata.fields` or `rows`, or has no fields at all.
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    /// A requested dimension or measure is not part of the result.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The shape request is inconsistent (e.g. pivot equals primary dimension).
    #[error("Invalid shape request: {0}")]
    InvalidRequest(String),

    /// An upstream call exceeded its deadline.
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Generated text contained no `{...}` span, or the span was not JSON.
    #[error("Could not extract JSON from generated text: {0}")]
    JsonExtractionFailure(String),

    /// A generated query spec failed schema validation.
    #[error("Invalid query: {0}")]
    Validation(String),

    /// The query or prompt service returned an error.
    #[error("Query service error: {0}")]
    Upstream(String),
}

impl ShapeError {
    /// Creates a malformed-result error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResult(msg.into())
    }

    /// Creates an unknown-field error for the given field name.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField(name.into())
    }

    /// Creates an invalid-request error with the given message.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates a JSON extraction error with the given message.
    pub fn json_extraction(msg: impl Into<String>) -> Self {
        Self::JsonExtractionFailure(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an upstream service error with the given message.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedResult(_) => "Malformed Result",
            Self::UnknownField(_) => "Unknown Field",
            Self::InvalidRequest(_) => "Invalid Request",
            Self::Timeout(_) => "Timeout",
            Self::JsonExtractionFailure(_) => "JSON Extraction Failure",
            Self::Validation(_) => "Validation Error",
            Self::Upstream(_) => "Upstream Error",
        }
    }

    /// Whether retrying the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Upstream(_) | Self::JsonExtractionFailure(_)
        )
    }

    /// Message shown in the conversation when this error ends a turn.
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedResult(_) | Self::UnknownField(_) | Self::InvalidRequest(_) => {
                "Sorry, I could not render this result.".to_string()
            }
            Self::Timeout(_) => "The request timed out. Please try again.".to_string(),
            Self::JsonExtractionFailure(_) => {
                "I could not understand the generated query. Please rephrase your question."
                    .to_string()
            }
            Self::Validation(msg) => format!("The generated query was invalid: {msg}"),
            Self::Upstream(_) => "Error processing request. Please try again.".to_string(),
        }
    }
}

/// Result type alias using ShapeError.
pub type Result<T> = std::result::Result<T, ShapeError>;
