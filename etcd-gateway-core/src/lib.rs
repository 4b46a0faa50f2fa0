//! Core protocol plumbing for the etcd JSON gateway client.
//!
//! This crate holds the transport-free pieces shared by any consumer of the
//! gateway wire format:
//!
//! - [`bytes64`]: the reversible text encoding used for binary fields
//!   embedded in gateway JSON (keys and values are raw byte strings on the
//!   etcd side, base64 text on the wire).
//! - [`framing`]: the incremental boundary scanner for the gateway's
//!   streaming responses, which are zero or more JSON objects concatenated
//!   back-to-back with no delimiter.
//!
//! Everything here is pure: no I/O, no async, no allocation beyond the
//! decoded values themselves.

pub mod bytes64;
pub mod framing;

pub use bytes64::DecodeError;
pub use framing::{ObjectScanner, ScanError};
