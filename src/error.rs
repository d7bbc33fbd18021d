//! # Error Handling
//!
//! Error taxonomy for stream extraction. Every failure while fetching or
//! normalizing a stream is a [`StreamError`]; nothing is retried locally and
//! nothing is swallowed, so a stream either yields all of its records or fails.

use thiserror::Error;

/// Failure while fetching or normalizing one stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status. Credential problems (401/403)
    /// land here as well.
    #[error("HTTP error {status} from {url}: {}", body.as_deref().unwrap_or("No body"))]
    Http {
        url: String,
        status: u16,
        body: Option<String>,
        headers: Vec<(String, String)>,
    },

    /// The body could not be decoded as JSON.
    #[error("malformed response from {url}: {details}")]
    MalformedResponse { url: String, details: String },

    /// The declared envelope key is absent from the response body.
    #[error("response for stream '{stream}' has no '{key}' key")]
    MissingEnvelope { stream: String, key: String },

    /// A declared field is absent from a raw record.
    #[error("record {index} of stream '{stream}' is missing declared field '{field}'")]
    MissingField {
        stream: String,
        field: String,
        index: usize,
    },

    /// A raw record is not a JSON object.
    #[error("record {index} of stream '{stream}' is not an object")]
    NotAnObject { stream: String, index: usize },

    /// A numeric literal does not parse as a decimal.
    #[error("field '{field}' of stream '{stream}' holds a number that is not a valid decimal: {literal}")]
    InvalidDecimal {
        stream: String,
        field: String,
        literal: String,
    },

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid value for header '{name}'")]
    InvalidHeader { name: String },
}

impl StreamError {
    /// HTTP status carried by the error, if upstream produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
