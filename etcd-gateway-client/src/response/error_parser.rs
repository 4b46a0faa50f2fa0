//! Error response parsing.
//!
//! The gateway reports failures as a non-2xx status whose body is usually a
//! JSON object (`{"error":"...","message":"...","code":5}`), but proxies
//! and older gateways also produce bare strings or plain text. This module
//! extracts the best available message and folds everything into
//! [`ClientError::Rpc`].

use http::StatusCode;
use serde_json::Value;

use crate::ClientError;

/// Build the error for a non-success response from its status and body.
pub(crate) fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    ClientError::Rpc {
        status,
        message: extract_message(status, body),
    }
}

/// Pull a human-readable message out of an error body.
///
/// Tries, in order: a JSON object's `message` (or `error`) field, a JSON
/// string body, the raw body text, and finally the HTTP reason phrase for
/// an empty body.
fn extract_message(status: StatusCode, body: &[u8]) -> String {
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => {
            if let Some(message) = map.get("message").or_else(|| map.get("error")) {
                if let Some(text) = message.as_str() {
                    return text.to_string();
                }
            }
            String::from_utf8_lossy(body).into_owned()
        }
        Ok(Value::String(text)) => text,
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}
