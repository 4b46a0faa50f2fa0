//! Response decoding: body-to-model for unary calls, incremental decoding
//! for streams.

pub mod decoder;
pub(crate) mod error_parser;

pub use decoder::JsonStreamDecoder;

use serde::de::DeserializeOwned;

use crate::ClientError;

/// Decode one JSON body into a typed model.
///
/// Invalid JSON is a [`ClientError::Decode`]; valid JSON whose shape does
/// not match the target type is a [`ClientError::Schema`].
pub(crate) fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(bytes).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => ClientError::Schema(e.to_string()),
        _ => ClientError::Decode(format!("invalid JSON body: {e}")),
    })
}
