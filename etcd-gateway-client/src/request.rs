//! Caller-built request payloads.
//!
//! A gateway request body is a JSON object whose byte-valued fields carry
//! base64 text. [`Payload`] is the mapping the caller assembles with raw
//! bytes; serialization routes every byte value through the codec, so
//! `payload.field("key", b"test_key")` reaches the wire as
//! `{"key":"dGVzdF9rZXk="}`.

use std::collections::BTreeMap;

use etcd_gateway_core::bytes64;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A single request field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Raw bytes, encoded as base64 text on the wire.
    Bytes(Vec<u8>),
    Str(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    /// A nested message.
    Map(Payload),
    List(Vec<FieldValue>),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Bytes(b) => serializer.serialize_str(&bytes64::encode(b)),
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Uint(v) => serializer.serialize_u64(*v),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Map(m) => m.serialize(serializer),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        FieldValue::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for FieldValue {
    fn from(v: &[u8; N]) -> Self {
        FieldValue::Bytes(v.to_vec())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Uint(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Payload> for FieldValue {
    fn from(v: Payload) -> Self {
        FieldValue::Map(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        FieldValue::List(v)
    }
}

/// An ordered field-name to value mapping forming a request body.
///
/// # Example
///
/// ```
/// use etcd_gateway_client::Payload;
///
/// let payload = Payload::new()
///     .field("key", b"test_key")
///     .field("limit", 10i64);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    fields: BTreeMap<String, FieldValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn byte_fields_serialize_as_base64() {
        let payload = Payload::new().field("key", b"test_key");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"key": "dGVzdF9rZXk="}));
    }

    #[test]
    fn nested_payload_serializes_recursively() {
        let payload = Payload::new().field(
            "create_request",
            Payload::new().field("key", b"test_key"),
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"create_request": {"key": "dGVzdF9rZXk="}}));
    }

    #[test]
    fn scalar_fields_keep_their_json_kind() {
        let payload = Payload::new()
            .field("limit", 10i64)
            .field("serializable", true)
            .field("range_end", b"\x00")
            .field("note", "text");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({"limit": 10, "serializable": true, "range_end": "AA==", "note": "text"})
        );
    }

    #[test]
    fn list_fields_serialize_elementwise() {
        let payload = Payload::new().field(
            "compare",
            vec![
                FieldValue::from(Payload::new().field("key", b"a")),
                FieldValue::from(Payload::new().field("key", b"b")),
            ],
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({"compare": [{"key": "YQ=="}, {"key": "Yg=="}]})
        );
    }

    #[test]
    fn empty_payload_is_an_empty_object() {
        let value = serde_json::to_value(Payload::new()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn repeated_field_replaces_previous_value() {
        let payload = Payload::new().field("key", b"a").field("key", b"b");
        assert_eq!(payload.len(), 1);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"key": "Yg=="}));
    }
}
