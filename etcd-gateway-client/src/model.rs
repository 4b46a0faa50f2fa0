//! Typed response models for the gateway's JSON bodies.
//!
//! One struct per response schema, shaped after `etcdserverpb`. The gateway
//! serializes messages with original proto field names (`create_revision`,
//! `raft_term`, but also etcd's camelCase oddities like `dbSize`), byte
//! fields as base64 text, and 64-bit integers as bare numbers or, in some
//! gateway versions, as decimal strings.
//!
//! Field conventions, applied uniformly:
//!
//! - every field is `#[serde(default)]`: a field absent from the JSON body
//!   materializes as its zero value, matching proto3 semantics;
//! - unknown JSON keys are dropped, so new server fields never break
//!   decoding;
//! - byte fields go through [`etcd_gateway_core::bytes64`] and are exposed
//!   as raw `Vec<u8>`;
//! - 64-bit integers are decoded through the [`int64`]/[`uint64`] adapters,
//!   which never round-trip through floating point, so values beyond 2^53
//!   (`cluster_id`, `member_id`) survive exactly.

use serde::{Deserialize, Serialize};

/// serde adapter for byte fields: raw bytes in the model, base64 text on
/// the wire.
pub(crate) mod b64 {
    use etcd_gateway_core::bytes64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        bytes64::decode(&text).map_err(serde::de::Error::custom)
    }
}

/// serde adapter for signed 64-bit fields: accepts a JSON number or a
/// decimal string.
pub(crate) mod int64 {
    use serde::Serializer;
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    pub fn serialize<S: Serializer>(v: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        struct Int64Visitor;

        impl<'de> Visitor<'de> for Int64Visitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a 64-bit integer or a decimal string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(|_| E::custom(format!("integer {v} overflows i64")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid integer string {v:?}")))
            }
        }

        deserializer.deserialize_any(Int64Visitor)
    }
}

/// serde adapter for unsigned 64-bit fields: accepts a JSON number or a
/// decimal string.
pub(crate) mod uint64 {
    use serde::Serializer;
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    pub fn serialize<S: Serializer>(v: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct Uint64Visitor;

        impl<'de> Visitor<'de> for Uint64Visitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an unsigned 64-bit integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
                u64::try_from(v).map_err(|_| E::custom(format!("negative integer {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid integer string {v:?}")))
            }
        }

        deserializer.deserialize_any(Uint64Visitor)
    }
}

/// Cluster metadata attached to every response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default, with = "uint64")]
    pub cluster_id: u64,
    #[serde(default, with = "uint64")]
    pub member_id: u64,
    /// Key-value store revision when the request was applied.
    #[serde(default, with = "int64")]
    pub revision: i64,
    #[serde(default, with = "uint64")]
    pub raft_term: u64,
}

/// A single key-value pair with its revision history metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default, with = "b64")]
    pub key: Vec<u8>,
    #[serde(default, with = "int64")]
    pub create_revision: i64,
    #[serde(default, with = "int64")]
    pub mod_revision: i64,
    #[serde(default, with = "int64")]
    pub version: i64,
    #[serde(default, with = "b64")]
    pub value: Vec<u8>,
    #[serde(default, with = "int64")]
    pub lease: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default)]
    pub kvs: Vec<KeyValue>,
    /// More keys exist below the requested range limit.
    #[serde(default)]
    pub more: bool,
    #[serde(default, with = "int64")]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PutResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_kv: Option<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteRangeResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default, with = "int64")]
    pub deleted: i64,
    #[serde(default)]
    pub prev_kvs: Vec<KeyValue>,
}

/// One arm of a transaction result; exactly one field is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxnOpResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_range: Option<RangeResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_put: Option<PutResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_delete_range: Option<DeleteRangeResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxnResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub responses: Vec<TxnOpResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventType {
    #[default]
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
}

/// A single watch event: a key was put or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub kv: KeyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_kv: Option<KeyValue>,
}

/// One message on a watch stream.
///
/// The first message on a new watch carries `created: true` and no events;
/// subsequent messages carry the events observed since the last one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatchResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default, with = "int64")]
    pub watch_id: i64,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default, with = "int64")]
    pub compact_revision: i64,
    #[serde(default)]
    pub cancel_reason: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaseGrantResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(rename = "ID", default, with = "int64")]
    pub id: i64,
    #[serde(rename = "TTL", default, with = "int64")]
    pub ttl: i64,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaseRevokeResponse {
    #[serde(default)]
    pub header: ResponseHeader,
}

/// Maintenance status of the member serving the request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub header: ResponseHeader,
    #[serde(default)]
    pub version: String,
    // etcd's rpc.proto names these fields in camelCase.
    #[serde(rename = "dbSize", default, with = "int64")]
    pub db_size: i64,
    #[serde(default, with = "uint64")]
    pub leader: u64,
    #[serde(rename = "raftIndex", default, with = "uint64")]
    pub raft_index: u64,
    #[serde(rename = "raftTerm", default, with = "uint64")]
    pub raft_term: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_fields_decode_to_raw_bytes() {
        let kv: KeyValue =
            serde_json::from_str(r#"{"key":"dGVzdF9rZXk=","value":"dGVzdF92YWx1ZQ=="}"#).unwrap();
        assert_eq!(kv.key, b"test_key");
        assert_eq!(kv.value, b"test_value");
    }

    #[test]
    fn large_integers_survive_exactly() {
        let header: ResponseHeader = serde_json::from_str(
            r#"{"cluster_id":11588568905070377092,"member_id":128088275939295631,"revision":3,"raft_term":2}"#,
        )
        .unwrap();
        assert_eq!(header.cluster_id, 11588568905070377092);
        assert_eq!(header.member_id, 128088275939295631);
        assert_eq!(header.revision, 3);
        assert_eq!(header.raft_term, 2);
    }

    #[test]
    fn integers_accepted_as_strings() {
        let header: ResponseHeader = serde_json::from_str(
            r#"{"cluster_id":"11588568905070377092","revision":"378"}"#,
        )
        .unwrap();
        assert_eq!(header.cluster_id, 11588568905070377092);
        assert_eq!(header.revision, 378);
    }

    #[test]
    fn negative_revision_accepted() {
        let header: ResponseHeader = serde_json::from_str(r#"{"revision":-1}"#).unwrap();
        assert_eq!(header.revision, -1);
    }

    #[test]
    fn missing_fields_default_to_zero_values() {
        let resp: RangeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.header, ResponseHeader::default());
        assert!(resp.kvs.is_empty());
        assert!(!resp.more);
        assert_eq!(resp.count, 0);
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let resp: RangeResponse =
            serde_json::from_str(r#"{"count":1,"some_future_field":{"x":[1,2,3]}}"#).unwrap();
        assert_eq!(resp.count, 1);
    }

    #[test]
    fn wrong_field_kind_is_an_error() {
        assert!(serde_json::from_str::<RangeResponse>(r#"{"kvs":5}"#).is_err());
        assert!(serde_json::from_str::<KeyValue>(r#"{"key":17}"#).is_err());
    }

    #[test]
    fn malformed_byte_field_is_an_error() {
        assert!(serde_json::from_str::<KeyValue>(r#"{"key":"%%%"}"#).is_err());
    }

    #[test]
    fn range_response_fixture() {
        let body = r#"{"header":{"cluster_id":11588568905070377092,"member_id":128088275939295631,"revision":3,"raft_term":2},"kvs":[{"key":"dGVzdF9rZXk=","create_revision":3,"mod_revision":3,"version":1,"value":"dGVzdF92YWx1ZQ=="}],"count":1}"#;
        let resp: RangeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.count, 1);
        assert_eq!(resp.kvs[0].key, b"test_key");
        assert_eq!(resp.kvs[0].value, b"test_value");
        assert_eq!(resp.kvs[0].create_revision, 3);
        assert_eq!(resp.header.cluster_id, 11588568905070377092);
    }

    #[test]
    fn watch_response_fixture() {
        let body = r#"{"header":{"raft_term":7,"revision":379},"events":[{"kv":{"mod_revision":379,"value":"dGVzdF92YWx1ZQ==","create_revision":379,"version":1,"key":"dGVzdF9rZXk="}}]}"#;
        let resp: WatchResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.created);
        assert_eq!(resp.events.len(), 1);
        assert_eq!(resp.events[0].event_type, EventType::Put);
        assert_eq!(resp.events[0].kv.key, b"test_key");
    }

    #[test]
    fn delete_event_type_parses() {
        let event: Event = serde_json::from_str(r#"{"type":"DELETE","kv":{"key":"YQ=="}}"#).unwrap();
        assert_eq!(event.event_type, EventType::Delete);
        assert_eq!(event.kv.key, b"a");
    }

    #[test]
    fn status_response_camel_case_fields() {
        let resp: StatusResponse = serde_json::from_str(
            r#"{"version":"3.3.0","dbSize":24576,"leader":128088275939295631,"raftIndex":10,"raftTerm":2}"#,
        )
        .unwrap();
        assert_eq!(resp.version, "3.3.0");
        assert_eq!(resp.db_size, 24576);
        assert_eq!(resp.raft_index, 10);
    }

    #[test]
    fn lease_grant_upper_case_fields() {
        let resp: LeaseGrantResponse =
            serde_json::from_str(r#"{"ID":7587848943773922710,"TTL":60}"#).unwrap();
        assert_eq!(resp.id, 7587848943773922710);
        assert_eq!(resp.ttl, 60);
    }

    #[test]
    fn byte_field_serializes_back_to_base64() {
        let kv = KeyValue {
            key: b"test_key".to_vec(),
            ..KeyValue::default()
        };
        let value = serde_json::to_value(&kv).unwrap();
        assert_eq!(value["key"], "dGVzdF9rZXk=");
    }
}
