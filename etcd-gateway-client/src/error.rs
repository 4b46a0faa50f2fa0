//! Error types for gateway RPC calls.
//!
//! This module provides [`ClientError`], the single error type surfaced by
//! every operation of the client.

use etcd_gateway_core::{DecodeError, ScanError};
use http::StatusCode;

/// Errors surfaced by gateway RPC calls.
///
/// Every failure, whether discovered up front on a unary call or partway
/// through iterating a stream, is reported through one of these variants.
/// Nothing is retried automatically; retry policy belongs to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Non-success status from the service, with the message extracted from
    /// the response body (or the HTTP reason phrase when the body is empty).
    #[error("rpc failed with status {status}: {message}")]
    Rpc {
        status: StatusCode,
        message: String,
    },

    /// Connection-level failure (unreachable, reset, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response could not be decoded (invalid JSON, malformed byte
    /// field, unframeable stream bytes).
    #[error("decode error: {0}")]
    Decode(String),

    /// A JSON value's shape does not match the expected schema.
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// The stream ended with an incomplete JSON object still buffered.
    #[error("stream truncated with {residue} bytes of an incomplete object")]
    TruncatedStream { residue: usize },

    /// The call was used in a way the gateway protocol does not allow,
    /// e.g. invoking a streaming method through the unary surface.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// HTTP status of the failed call, for [`ClientError::Rpc`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Rpc { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message carried by the error.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Rpc { message, .. } => message,
            ClientError::Transport(msg)
            | ClientError::Encode(msg)
            | ClientError::Decode(msg)
            | ClientError::Schema(msg)
            | ClientError::Protocol(msg) => msg,
            ClientError::TruncatedStream { .. } => "stream truncated",
        }
    }

    /// Whether the service itself rejected the call (as opposed to a local
    /// or transport-level failure).
    pub fn is_rpc(&self) -> bool {
        matches!(self, ClientError::Rpc { .. })
    }
}

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<ScanError> for ClientError {
    fn from(err: ScanError) -> Self {
        ClientError::Decode(err.to_string())
    }
}
