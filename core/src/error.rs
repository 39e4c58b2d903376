//! Error types for the booth API client.
//!
//! # Design
//! Nothing is recovered locally. Each variant corresponds to one stage of a
//! request: configuration, serialization, transport, HTTP status and body
//! parsing. Transport errors keep the underlying error untouched.

use thiserror::Error;

/// Boxed error produced by a `Transport`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Longest body preview embedded in a parse error, in characters.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The API base URL was never configured.
    #[error("API base URL is not set: {0}")]
    Config(String),

    /// The request body could not be serialized to JSON.
    #[error("request body serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The network round-trip itself failed.
    #[error("{0}")]
    Transport(#[source] BoxError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {status_text}\n{detail}")]
    Http {
        status: u16,
        status_text: String,
        detail: String,
    },

    /// A successful response carried a body that is not valid JSON, or that
    /// does not match the requested type.
    #[error("invalid JSON response (first 200 chars): {preview}")]
    Parse { preview: String },

    /// A typed request expected a body but the server sent none.
    #[error("empty response body")]
    EmptyBody,
}

impl ApiError {
    /// Status code of an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn parse(text: &str) -> Self {
        ApiError::Parse {
            preview: text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}
