//! Codec module - primitive value encoding and decoding.
//!
//! The leaf layer of the stack: varint integers, fixed64 doubles, and
//! length-prefixed payloads, plus the closed [`Value`] variant set they
//! decode into. Everything here is pure and stateless between calls; each
//! invocation operates on its own buffer.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use tagwire::codec::{decode_expected, encode_payload, read_payload, Kind, Value};
//!
//! let mut buf = BytesMut::new();
//! let wire_type = encode_payload(&mut buf, &Value::Int32(42)).unwrap();
//!
//! let bytes = buf.freeze();
//! let mut pos = 0;
//! let raw = read_payload(&bytes, &mut pos, wire_type).unwrap();
//! assert_eq!(decode_expected(&raw, Kind::Int32, 1).unwrap(), Value::Int32(42));
//! ```

pub mod varint;

mod value;

pub use value::{decode_expected, encode_payload, read_payload, Kind, RawValue, Value, WireType};
