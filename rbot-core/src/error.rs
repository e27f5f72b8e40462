//! Error types for the SDK.
//!
//! [`BotError`] is the top-level error surfaced to callers and to the error hook.
//! [`TransportError`] is what a [`crate::Transport`] raises; [`NormalizeError`] marks one raw update
//! that could not be turned into an [`crate::UpdateEvent`].

use thiserror::Error;

use crate::types::{UpdateEndpointType, UpdateKind};

/// Top-level error (validation, network, auth, API, normalization, handler, upload, config, webhook, IO).
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
        response: Option<serde_json::Value>,
    },

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizeError),

    #[error("Handler error: {0}")]
    Handler(anyhow::Error),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Webhook registration failed for {failed:?} (applied: {applied:?})")]
    Webhook {
        applied: Vec<UpdateEndpointType>,
        failed: Vec<(UpdateEndpointType, String)>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Shorthand for [`BotError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures that a later retry may not repeat (timeouts, dropped connections).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Faults raised by the HTTP transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
        response: serde_json::Value,
    },
}

impl From<TransportError> for BotError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => BotError::Network("Request timeout".to_string()),
            TransportError::Connection(msg) => BotError::Network(format!("Connection error: {msg}")),
            TransportError::HttpStatus { status: 401 } => BotError::Auth("Invalid token".to_string()),
            TransportError::HttpStatus { status } => BotError::Api {
                message: format!("HTTP error: {status}"),
                status: Some(status),
                response: None,
            },
            TransportError::MalformedResponse(msg) => BotError::Api {
                message: format!("Invalid JSON response: {msg}"),
                status: None,
                response: None,
            },
            TransportError::Api {
                message,
                status,
                response,
            } => BotError::Api {
                message,
                status,
                response: Some(response),
            },
        }
    }
}

/// Why a single raw update was dropped by the normalizer.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("update is not a JSON object")]
    NotAnObject,

    #[error("{kind} update has no `{field}` payload")]
    MissingPayload {
        kind: UpdateKind,
        field: &'static str,
    },

    #[error("invalid `{field}`: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for SDK operations; uses [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status_maps_to_auth() {
        let err: BotError = TransportError::HttpStatus { status: 401 }.into();
        assert!(matches!(err, BotError::Auth(_)));
    }

    #[test]
    fn test_other_status_maps_to_api_with_status() {
        let err: BotError = TransportError::HttpStatus { status: 502 }.into();
        match err {
            BotError::Api { status, .. } => assert_eq!(status, Some(502)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_keeps_platform_message() {
        let err: BotError = TransportError::Api {
            message: "INVALID_INPUT".to_string(),
            status: Some(200),
            response: serde_json::json!({"status": "INVALID_INPUT"}),
        }
        .into();
        assert_eq!(err.to_string(), "API error: INVALID_INPUT");
    }

    #[test]
    fn test_timeout_and_connection_are_network() {
        let timeout: BotError = TransportError::Timeout.into();
        let conn: BotError = TransportError::Connection("refused".to_string()).into();
        assert!(timeout.is_network());
        assert!(conn.is_network());
    }
}
