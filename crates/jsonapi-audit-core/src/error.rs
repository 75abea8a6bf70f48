//! Error types for the validation engine
//!
//! Validation problems found in a document are never errors: they are
//! reported as [`Finding`](crate::finding::Finding)s. The [`Error`] type covers
//! problems with the *input contract* itself (an envelope that cannot be
//! deserialized, a request URL that cannot be parsed) and internal stage
//! failures, which the orchestrator turns into a single failed finding.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The validation input is missing something the engine needs
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// A URL in the input could not be parsed
    #[error("Invalid URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A query parameter name could not be parsed
    #[error("Malformed query parameter '{name}': {message}")]
    QueryParameter { name: String, message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a URL parse error
    pub fn url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::Url {
            url: url.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
