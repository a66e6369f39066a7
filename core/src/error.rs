//! Error types for the todo API client.
//!
//! # Design
//! Failure-status responses split on the body they arrive with: a JSON body
//! becomes `Api` carrying the server's own message, anything else becomes
//! `Transport` with the raw text for debugging. `Format` covers success
//! responses whose body cannot be read as JSON. Bodies quoted in messages are
//! truncated by the caller before they land here, never in `Display`.

use std::fmt;

/// Errors returned by `ApiClient` operations.
#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response, e.g. a refused connection or
    /// DNS failure.
    Network(String),

    /// The server answered a failure status with a JSON body; `message` is
    /// the server's `message`/`detail` field, or the status text when the
    /// body was not parseable.
    Api { status: u16, message: String },

    /// The server answered a failure status with a non-JSON body, typically
    /// an HTML error page from a reverse proxy.
    Transport {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The server signalled success but the body could not be read as JSON.
    Format { body: String },

    /// The request payload could not be serialized to JSON.
    Serialization(String),

    /// The response parsed as JSON but did not match the expected type.
    Deserialization(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(message) => {
                write!(f, "network error: {message}")
            }
            ClientError::Api { status, message } => {
                write!(f, "HTTP error! status: {status}, message: {message}")
            }
            ClientError::Transport {
                status,
                status_text,
                body,
            } => {
                write!(
                    f,
                    "HTTP error! status: {status}, message: {status_text}. Received: {body}..."
                )
            }
            ClientError::Format { body } => {
                write!(f, "Expected JSON response but got: {body}...")
            }
            ClientError::Serialization(message) => {
                write!(f, "serialization failed: {message}")
            }
            ClientError::Deserialization(message) => {
                write!(f, "deserialization failed: {message}")
            }
        }
    }
}

impl std::error::Error for ClientError {}
