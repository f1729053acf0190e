use models::ModelError;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by the HTTP transport.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The request never produced an HTTP response (connect, TLS, decoding, ...).
    #[error("client error: {0}")]
    Client(String),
    /// The backend answered with a non-2xx status.
    #[error("backend returned code {status}, body was: {body}")]
    Status { status: u16, body: Value },
}

impl TransportError {
    /// Body text is kept as JSON when it parses, otherwise as a JSON string.
    pub fn status(status: u16, body: &str) -> Self {
        let body = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
        };
        Self::Status { status, body }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("parse error: {0}")]
    Parse(#[from] ModelError),
    #[error("request cancelled before completion")]
    Cancelled,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    /// HTTP status of a backend failure, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
