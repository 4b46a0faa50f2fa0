//! Gateway RPC client implementation.
//!
//! This module provides the main [`GatewayClient`] type for making unary
//! and streaming calls against an etcd JSON gateway.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, header};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

#[cfg(feature = "tracing")]
use tracing::info_span;

use crate::ClientError;
use crate::builder::ClientBuilder;
use crate::request::Payload;
use crate::response::error_parser::error_from_response;
use crate::response::{JsonStreamDecoder, decode_json};
use crate::rpc::{self, RawFrame, RpcResponse};
use crate::streaming::{ByteStream, RpcStream, Streaming};
use crate::transport::{HttpTransport, RequestBody};

/// Client for an etcd v3 JSON gateway.
///
/// Cheap to clone; clones share the transport's connection pool. Use
/// [`ClientBuilder`] or [`GatewayClient::builder`] to create an instance.
///
/// Two call surfaces are offered:
///
/// - the typed surface, [`call_unary`](Self::call_unary) /
///   [`call_server_stream`](Self::call_server_stream), generic over the
///   request and response types;
/// - the dynamic surface, [`call_rpc`](Self::call_rpc) /
///   [`call_rpc_stream`](Self::call_rpc_stream), which takes a gateway
///   method path plus a [`Payload`] and dispatches the response schema
///   through the method table.
///
/// # Example
///
/// ```ignore
/// use etcd_gateway_client::{GatewayClient, Payload, RpcResponse};
///
/// let client = GatewayClient::builder("http://127.0.0.1:2379").build()?;
///
/// let response = client
///     .call_rpc("/v3alpha/kv/range", &Payload::new().field("key", b"test_key"))
///     .await?;
/// if let RpcResponse::Range(range) = response {
///     println!("{} keys", range.count);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GatewayClient {
    /// HTTP transport (owns the connection pool).
    transport: HttpTransport,
    /// Base URL of the gateway, without a trailing slash.
    base_url: String,
    /// Default timeout applied to the request phase of each call.
    default_timeout: Option<Duration>,
}

impl GatewayClient {
    /// Create a new [`ClientBuilder`] with the given base URL.
    pub fn builder<S: Into<String>>(base_url: S) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Called by [`ClientBuilder::build`]. Prefer the builder API.
    pub(crate) fn new(
        transport: HttpTransport,
        base_url: String,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            base_url,
            default_timeout,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Release the client's pooled transport resources.
    ///
    /// The pool is shared by reference across clones; its connections
    /// close once the last clone and any open stream sessions are gone.
    /// Dropping the client has the same effect, this just makes the
    /// release explicit at call sites that want it.
    pub fn close(self) {}

    /// Issue one POST to a gateway path, applying the configured timeout.
    async fn post(
        &self,
        path: &str,
        body: Bytes,
    ) -> Result<http::Response<Incoming>, ClientError> {
        // Strip the leading slash from the path to avoid double slashes.
        let path = path.strip_prefix('/').unwrap_or(path);
        let url = format!("{}/{}", self.base_url, path);

        let request = Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(RequestBody::new(body))
            .map_err(|e| ClientError::Protocol(format!("failed to build request: {e}")))?;

        if let Some(t) = self.default_timeout {
            timeout(t, self.transport.request(request))
                .await
                .map_err(|_| ClientError::Transport(format!("request timed out after {t:?}")))?
        } else {
            self.transport.request(request).await
        }
    }

    /// Make a unary RPC call.
    ///
    /// Serializes `request` as the JSON body, POSTs it to `path`, and
    /// decodes the whole response body into `Res`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Encode`] when the request cannot be serialized
    /// - [`ClientError::Transport`] for connection-level failures
    /// - [`ClientError::Rpc`] for a non-success status, with the message
    ///   extracted from the error body
    /// - [`ClientError::Decode`] / [`ClientError::Schema`] when the body
    ///   cannot be materialized as `Res`
    pub async fn call_unary<Req, Res>(&self, path: &str, request: &Req) -> Result<Res, ClientError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        #[cfg(feature = "tracing")]
        let _span = info_span!(
            "rpc.call",
            rpc.method = %path,
            rpc.type = "unary",
            otel.kind = "client",
        )
        .entered();

        let body = serde_json::to_vec(request)
            .map_err(|e| ClientError::Encode(format!("JSON encoding failed: {e}")))?;

        let response = self.post(path, Bytes::from(body)).await?;
        let response = ensure_success(response).await?;

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?
            .to_bytes();

        decode_json(&body_bytes)
    }

    /// Make a server-streaming RPC call.
    ///
    /// The response body is an open-ended sequence of concatenated JSON
    /// objects; the returned session decodes them lazily, one `Res` per
    /// pulled item. The session exclusively owns the underlying
    /// connection; dropping it or calling [`Streaming::close`] releases
    /// the connection.
    ///
    /// A non-success status is turned into [`ClientError::Rpc`] up front,
    /// before any stream decoding, exactly as on the unary path.
    pub async fn call_server_stream<Req, Res>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Streaming<JsonStreamDecoder<ByteStream, Res>>, ClientError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        #[cfg(feature = "tracing")]
        let _span = info_span!(
            "rpc.call",
            rpc.method = %path,
            rpc.type = "server_stream",
            otel.kind = "client",
        )
        .entered();

        let body = serde_json::to_vec(request)
            .map_err(|e| ClientError::Encode(format!("JSON encoding failed: {e}")))?;

        let response = self.post(path, Bytes::from(body)).await?;
        let response = ensure_success(response).await?;

        let byte_stream = body_to_stream(response.into_body());
        Ok(Streaming::new(JsonStreamDecoder::new(byte_stream)))
    }

    /// Make a unary call on the dynamic surface.
    ///
    /// Resolves `path` through the method table and materializes the
    /// response as the matching [`RpcResponse`] variant. Paths outside the
    /// table are still issued (the service decides whether they exist); a
    /// success response on such a path comes back as
    /// [`RpcResponse::Raw`].
    pub async fn call_rpc(&self, path: &str, payload: &Payload) -> Result<RpcResponse, ClientError> {
        let method = rpc::resolve(path);
        if let Some(method) = method {
            if method.streaming {
                return Err(ClientError::Protocol(format!(
                    "{path} is a streaming method; use call_rpc_stream"
                )));
            }
        }

        let value: serde_json::Value = self.call_unary(path, payload).await?;
        match method {
            Some(method) => method.kind.build(value),
            None => Ok(RpcResponse::Raw(value)),
        }
    }

    /// Make a streaming call on the dynamic surface.
    ///
    /// Returns an [`RpcStream`] yielding one [`RpcResponse`] per gateway
    /// stream frame, unwrapped from the `{"result": ...}` envelope. The
    /// sequence is single-pass: items are decoded only as the consumer
    /// advances, and closing the session releases the connection.
    pub async fn call_rpc_stream(
        &self,
        path: &str,
        payload: &Payload,
    ) -> Result<RpcStream, ClientError> {
        let method = rpc::resolve(path);
        if let Some(method) = method {
            if !method.streaming {
                return Err(ClientError::Protocol(format!(
                    "{path} is a unary method; use call_rpc"
                )));
            }
        }

        let frames = self.call_server_stream::<_, RawFrame>(path, payload).await?;
        Ok(RpcStream::new(frames, method.map(|m| m.kind)))
    }
}

/// Turn a non-success response into an [`ClientError::Rpc`], reading the
/// full error body for the message. Applied identically on the unary and
/// streaming paths, before any decoding.
async fn ensure_success(
    response: http::Response<Incoming>,
) -> Result<http::Response<Incoming>, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ClientError::Transport(format!("failed to read error body: {e}")))?
        .to_bytes();

    Err(error_from_response(status, &body_bytes))
}

/// Convert a hyper body into a stream of data chunks.
fn body_to_stream(body: Incoming) -> ByteStream {
    use futures::StreamExt;

    Box::pin(
        futures::stream::unfold(body, |mut body| async move {
            match body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        Some((Ok(data), body))
                    } else {
                        // Trailers or other frame types - skip
                        Some((Ok(Bytes::new()), body))
                    }
                }
                Some(Err(e)) => Some((
                    Err(ClientError::Transport(format!("stream error: {e}"))),
                    body,
                )),
                None => None,
            }
        })
        .filter(|result| {
            // Filter out empty chunks
            futures::future::ready(match result {
                Ok(bytes) => !bytes.is_empty(),
                Err(_) => true,
            })
        }),
    )
}
