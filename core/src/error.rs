//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the todo
//! no longer exists" from "the server returned an unexpected status". All
//! other non-2xx responses land in `Http` with the raw status code and body.
//! Errors are `Clone` so the query cache and mutation controllers can keep
//! the last failure around for rendering.

use thiserror::Error;

/// Errors returned by `TodoClient` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("todo not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialize(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// The request never produced a response.
    #[error("{0}")]
    Transport(#[from] TransportError),
}

/// Failure raised by a [`Transport`](crate::transport::Transport) before any
/// response was received (DNS, connection refused, TLS, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("network error: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
