//! Byte-field codec for gateway JSON.
//!
//! etcd keys and values are arbitrary byte strings; the JSON gateway carries
//! them as standard (padded) base64 text, e.g. `"dGVzdF9rZXk="`. This module
//! provides the encode/decode pair used on both the request and response
//! paths. Decoding also accepts unpadded input, since proxies and older
//! gateway versions are not consistent about padding.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

/// The textual representation is not valid base64.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid base64 byte field: {0}")]
pub struct DecodeError(pub(crate) String);

/// Encode raw bytes as the gateway's textual byte-field representation.
///
/// Zero-length input encodes to the empty string.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a textual byte field back to raw bytes.
///
/// Exact inverse of [`encode`]. Fails with [`DecodeError`] when the text is
/// not valid base64 (bad alphabet or malformed padding).
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(text)
        .or_else(|_| STANDARD_NO_PAD.decode(text))
        .map_err(|e| DecodeError(e.to_string()))
}
