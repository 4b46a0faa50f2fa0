//! Client for etcd v3's JSON gateway (grpc-gateway).
//!
//! The gateway translates etcd's internal binary RPC protocol to plain
//! HTTP/JSON: each RPC is a POST path, byte fields travel as base64 text,
//! and streaming RPCs deliver an open-ended sequence of JSON objects
//! concatenated over one long-lived chunked response. This crate speaks
//! that dialect: it encodes request payloads, decodes unary bodies and
//! watch streams into typed models, and surfaces transport/service
//! failures through one error type.
//!
//! ## Unary example
//!
//! ```ignore
//! use etcd_gateway_client::{GatewayClient, Payload, RpcResponse};
//!
//! let client = GatewayClient::builder("http://127.0.0.1:2379").build()?;
//!
//! let response = client
//!     .call_rpc("/v3alpha/kv/range", &Payload::new().field("key", b"test_key"))
//!     .await?;
//!
//! if let RpcResponse::Range(range) = response {
//!     for kv in &range.kvs {
//!         println!("{:?} = {:?}", kv.key, kv.value);
//!     }
//! }
//! ```
//!
//! ## Watch example
//!
//! ```ignore
//! use etcd_gateway_client::{GatewayClient, Payload};
//! use futures::StreamExt;
//!
//! let client = GatewayClient::builder("http://127.0.0.1:2379").build()?;
//!
//! let mut watch = client
//!     .call_rpc_stream(
//!         "/v3alpha/watch",
//!         &Payload::new().field(
//!             "create_request",
//!             Payload::new().field("key", b"test_key"),
//!         ),
//!     )
//!     .await?;
//!
//! while let Some(event) = watch.next().await {
//!     match event {
//!         Ok(response) => println!("{response:?}"),
//!         Err(e) => {
//!             eprintln!("watch failed: {e}");
//!             break;
//!         }
//!     }
//! }
//!
//! // Abandoning the loop is enough to release the connection; close()
//! // does it explicitly mid-iteration.
//! watch.close();
//! ```
//!
//! ## Typed surface
//!
//! When the request/response types are known at the call site, the generic
//! surface skips the method table:
//!
//! ```ignore
//! use etcd_gateway_client::model::RangeResponse;
//! use serde_json::json;
//!
//! let range: RangeResponse = client
//!     .call_unary("/v3alpha/kv/range", &json!({"key": "dGVzdF9rZXk="}))
//!     .await?;
//! ```
//!
//! ## Streams and cancellation
//!
//! A streaming call returns a lazy, single-pass session that exclusively
//! owns its HTTP connection. Nothing reads ahead: bytes are pulled from
//! the socket only when the consumer polls for the next item, so a slow
//! consumer exerts backpressure by doing nothing. Dropping the session or
//! calling `close()` releases the connection promptly; a closed session
//! never yields again.
//!
//! ## Errors
//!
//! All failures surface as [`ClientError`]: a non-success HTTP status
//! becomes [`ClientError::Rpc`] with the message extracted from the body,
//! connection failures become [`ClientError::Transport`], and decode
//! problems are split between [`ClientError::Decode`] (unparseable bytes),
//! [`ClientError::Schema`] (shape mismatch) and
//! [`ClientError::TruncatedStream`] (stream ended mid-object). Errors on a
//! stream surface at the pull that discovers them; earlier items stay
//! valid. Nothing is retried automatically.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `tls` (default) | rustls with ring and native roots |
//! | `tls-ring` / `tls-aws-lc` | crypto provider selection |
//! | `tls-native-roots` / `tls-webpki-roots` | root store selection |
//! | `tracing` | spans (`rpc.call`) around each RPC |

mod builder;
mod client;
mod error;
pub mod model;
pub mod request;
pub mod response;
pub mod rpc;
mod streaming;
pub mod transport;

pub use builder::ClientBuilder;
pub use client::GatewayClient;
pub use error::ClientError;

// Re-export from request module
pub use request::{FieldValue, Payload};

// Re-export from response module
pub use response::JsonStreamDecoder;

// Re-export from rpc module
pub use rpc::{METHODS, MethodDescriptor, ResponseKind, RpcResponse, resolve};

// Re-export from streaming module
pub use streaming::{ByteStream, RpcStream, Streaming};

// Re-export transport types at the top level for convenience
pub use transport::{HttpTransport, HttpTransportBuilder, RequestBody};

// Re-export core types that users need
pub use etcd_gateway_core::{DecodeError, ScanError, bytes64};

// Re-export commonly needed third-party types
pub use bytes::Bytes;
