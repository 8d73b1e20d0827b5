//! Error types for XRPC client operations

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Client error type wrapping all possible error conditions
///
/// Generated client methods return this type. Errors produced by the
/// transport are handed back to the caller exactly as the transport built
/// them.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ClientError {
    /// The server answered with an XRPC error body
    #[error(transparent)]
    #[diagnostic(transparent)]
    Xrpc(#[from] XrpcError),

    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// Request serialization failed
    #[error("{0}")]
    Encode(
        #[from]
        #[diagnostic_source]
        EncodeError,
    ),

    /// Response deserialization failed
    #[error("{0}")]
    Decode(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),

    /// The generated client cannot perform this operation
    #[error("operation not supported: {method}")]
    #[diagnostic(
        code(bobbin::unsupported),
        help("event-stream subscriptions need a streaming transport")
    )]
    Unsupported {
        /// XRPC method id of the operation
        method: SmolStr,
    },
}

impl ClientError {
    /// Signal that `method` cannot be called through a generated client
    pub fn unsupported(method: impl Into<SmolStr>) -> Self {
        Self::Unsupported {
            method: method.into(),
        }
    }

    /// The XRPC protocol error, if this is one
    pub fn as_xrpc(&self) -> Option<&XrpcError> {
        match self {
            Self::Xrpc(err) => Some(err),
            _ => None,
        }
    }
}

/// XRPC protocol error returned by a server
///
/// Built from a non-2xx response whose body follows the XRPC error shape
/// `{"error": "...", "message": "..."}`. Any additional fields are kept in
/// `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error, miette::Diagnostic)]
#[serde(rename_all = "camelCase")]
#[error("XRPC error {status_code} {error_code}: {message}")]
#[diagnostic(code(bobbin::xrpc))]
pub struct XrpcError {
    /// HTTP status code of the response
    pub status_code: u16,
    /// Machine-readable error name
    pub error_code: SmolStr,
    /// Human-readable message (empty when the server sent none)
    pub message: String,
    /// Extra fields from the error body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<SmolStr>,
    message: Option<String>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl XrpcError {
    /// Create an error with no extra details
    pub fn new(status_code: u16, error_code: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Interpret an error response body
    ///
    /// Bodies that are not XRPC error JSON still produce an error, with the
    /// code set to `Unknown` and the raw body as the message.
    pub fn from_body(status_code: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => Self {
                status_code,
                error_code: parsed.error.unwrap_or_else(|| SmolStr::new_static("Unknown")),
                message: parsed.message.unwrap_or_default(),
                details: if parsed.rest.is_empty() {
                    None
                } else {
                    Some(serde_json::Value::Object(parsed.rest))
                },
            },
            Err(_) => Self::new(
                status_code,
                "Unknown",
                String::from_utf8_lossy(body).into_owned(),
            ),
        }
    }
}

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to server
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other transport error
    #[error("Transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Error type for encoding XRPC requests
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// Failed to serialize query parameters
    #[error("Failed to serialize query: {0}")]
    Query(
        #[from]
        #[source]
        serde_html_form::ser::Error,
    ),
    /// Failed to serialize JSON body
    #[error("Failed to serialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
    /// Parameters did not serialize to a JSON object
    #[error("XRPC parameters must serialize to an object, got {0}")]
    NotAnObject(&'static str),
}

/// Response deserialization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// JSON deserialization failed
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
}

/// Result type for client operations
pub type XrpcResult<T> = std::result::Result<T, ClientError>;

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_with_details() {
        let body = br#"{"error":"RecordNotFound","message":"no such record","uri":"at://x"}"#;
        let err = XrpcError::from_body(400, body);
        assert_eq!(err.status_code, 400);
        assert_eq!(err.error_code, "RecordNotFound");
        assert_eq!(err.message, "no such record");
        assert_eq!(
            err.details,
            Some(serde_json::json!({ "uri": "at://x" }))
        );
    }

    #[test]
    fn error_body_not_json() {
        let err = XrpcError::from_body(502, b"bad gateway");
        assert_eq!(err.error_code, "Unknown");
        assert_eq!(err.message, "bad gateway");
        assert!(err.details.is_none());
    }

    #[test]
    fn unsupported_display() {
        let err = ClientError::unsupported("com.example.subscribe");
        assert_eq!(err.to_string(), "operation not supported: com.example.subscribe");
        assert!(err.as_xrpc().is_none());
    }
}
