//! Method table and dynamic response dispatch.
//!
//! The gateway exposes each RPC as a POST path (`/v3alpha/kv/range`,
//! `/v3alpha/watch`, ...). [`METHODS`] is the static table mapping those
//! paths to their response schema and call shape; [`ResponseKind::build`]
//! materializes the typed model for a decoded JSON value.
//!
//! Paths are matched after stripping the API prefix, so `/v3/kv/range`,
//! `/v3alpha/kv/range` and `/v3beta/kv/range` all resolve to the same
//! method. Unknown paths are not rejected here: the call is issued anyway
//! and the service decides whether the path exists, which is how a gateway
//! 404 surfaces as an RPC error rather than a local one.

use serde::Deserialize;
use serde_json::Value;

use crate::ClientError;
use crate::model::{
    DeleteRangeResponse, LeaseGrantResponse, LeaseRevokeResponse, PutResponse, RangeResponse,
    StatusResponse, TxnResponse, WatchResponse,
};

/// Response schema of a gateway method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Range,
    Put,
    DeleteRange,
    Txn,
    Watch,
    LeaseGrant,
    LeaseRevoke,
    Status,
}

/// One entry of the method table.
#[derive(Debug, Clone, Copy)]
pub struct MethodDescriptor {
    /// Path relative to the API prefix.
    pub path: &'static str,
    /// Schema the response body decodes into.
    pub kind: ResponseKind,
    /// Whether the response body is a stream of concatenated objects.
    pub streaming: bool,
}

/// The gateway methods this client knows how to decode.
pub const METHODS: &[MethodDescriptor] = &[
    MethodDescriptor {
        path: "kv/range",
        kind: ResponseKind::Range,
        streaming: false,
    },
    MethodDescriptor {
        path: "kv/put",
        kind: ResponseKind::Put,
        streaming: false,
    },
    MethodDescriptor {
        path: "kv/deleterange",
        kind: ResponseKind::DeleteRange,
        streaming: false,
    },
    MethodDescriptor {
        path: "kv/txn",
        kind: ResponseKind::Txn,
        streaming: false,
    },
    MethodDescriptor {
        path: "watch",
        kind: ResponseKind::Watch,
        streaming: true,
    },
    MethodDescriptor {
        path: "lease/grant",
        kind: ResponseKind::LeaseGrant,
        streaming: false,
    },
    MethodDescriptor {
        path: "lease/revoke",
        kind: ResponseKind::LeaseRevoke,
        streaming: false,
    },
    // Older gateway versions nest lease revocation under /kv.
    MethodDescriptor {
        path: "kv/lease/revoke",
        kind: ResponseKind::LeaseRevoke,
        streaming: false,
    },
    MethodDescriptor {
        path: "maintenance/status",
        kind: ResponseKind::Status,
        streaming: false,
    },
];

/// Look up the descriptor for a gateway path.
///
/// The leading slash and a `v3*` API prefix segment are ignored.
pub fn resolve(path: &str) -> Option<&'static MethodDescriptor> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = match path.split_once('/') {
        Some((prefix, rest)) if prefix.starts_with("v3") => rest,
        _ => path,
    };
    METHODS.iter().find(|m| m.path == path)
}

/// A decoded gateway response, tagged by schema.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Range(RangeResponse),
    Put(PutResponse),
    DeleteRange(DeleteRangeResponse),
    Txn(TxnResponse),
    Watch(WatchResponse),
    LeaseGrant(LeaseGrantResponse),
    LeaseRevoke(LeaseRevokeResponse),
    Status(StatusResponse),
    /// A 2xx response on a path outside the method table, preserved as-is.
    Raw(Value),
}

impl RpcResponse {
    /// The watch payload, if this is a watch response.
    pub fn as_watch(&self) -> Option<&WatchResponse> {
        match self {
            RpcResponse::Watch(w) => Some(w),
            _ => None,
        }
    }

    /// The range payload, if this is a range response.
    pub fn as_range(&self) -> Option<&RangeResponse> {
        match self {
            RpcResponse::Range(r) => Some(r),
            _ => None,
        }
    }
}

impl ResponseKind {
    /// Materialize the typed model for a decoded JSON value.
    ///
    /// A value whose shape does not match the schema fails with
    /// [`ClientError::Schema`].
    pub fn build(self, value: Value) -> Result<RpcResponse, ClientError> {
        fn typed<T: serde::de::DeserializeOwned>(
            value: Value,
            wrap: fn(T) -> RpcResponse,
        ) -> Result<RpcResponse, ClientError> {
            serde_json::from_value(value)
                .map(wrap)
                .map_err(|e| ClientError::Schema(e.to_string()))
        }

        match self {
            ResponseKind::Range => typed(value, RpcResponse::Range),
            ResponseKind::Put => typed(value, RpcResponse::Put),
            ResponseKind::DeleteRange => typed(value, RpcResponse::DeleteRange),
            ResponseKind::Txn => typed(value, RpcResponse::Txn),
            ResponseKind::Watch => typed(value, RpcResponse::Watch),
            ResponseKind::LeaseGrant => typed(value, RpcResponse::LeaseGrant),
            ResponseKind::LeaseRevoke => typed(value, RpcResponse::LeaseRevoke),
            ResponseKind::Status => typed(value, RpcResponse::Status),
        }
    }
}

/// One object on a streaming response body.
///
/// The gateway wraps every streamed message in `{"result": ...}` and
/// reports mid-stream failures as `{"error": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFrame {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<FrameError>,
}

/// Error payload of a `{"error": ...}` stream frame.
#[derive(Debug, Deserialize)]
pub(crate) struct FrameError {
    #[serde(default)]
    pub http_code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FrameError {
    pub fn into_client_error(self) -> ClientError {
        let status = self
            .http_code
            .and_then(|c| http::StatusCode::from_u16(c).ok())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        ClientError::Rpc {
            status,
            message: self.message.unwrap_or_else(|| "stream error".to_string()),
        }
    }
}
