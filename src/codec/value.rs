//! The value model: typed variants, wire types, and payload codec.
//!
//! A [`Value`] is one member of the closed variant set the protocol can
//! carry. On the wire every value travels under one of three wire types:
//!
//! - `Varint` (0): Int32, Int64 (two's-complement 64-bit), Bool
//! - `Fixed64` (1): Double (8-byte little-endian bit pattern)
//! - `Delimited` (2): String, Bytes, nested Object bodies, list elements
//!
//! Lists are a field-level construct: a list field appears on the wire as
//! repeated occurrences of the same field number, one delimited entry per
//! element. The codec here covers single payloads; repetition lives in the
//! writer and reader.

use bytes::{BufMut, Bytes, BytesMut};

use super::varint::{read_varint, write_varint};
use crate::error::{ProtoError, Result};

/// Wire type carried in the low three bits of a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer payload.
    Varint = 0,
    /// Fixed 8-byte payload.
    Fixed64 = 1,
    /// Length-prefixed payload (string/bytes/object/list element).
    Delimited = 2,
}

impl WireType {
    /// Decode the low three bits of a field tag.
    pub fn from_tag_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Delimited),
            other => Err(ProtoError::Malformed(format!(
                "reserved wire type {other}"
            ))),
        }
    }

    /// Human-readable name, used in error reporting.
    pub fn name(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::Delimited => "length-delimited",
        }
    }
}

/// Expected kind for a field, declared by the message schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Boolean.
    Bool,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
    /// Opaque byte blob.
    Bytes,
    /// Nested object.
    Object,
    /// Ordered list of objects.
    List,
}

impl Kind {
    /// The wire type values of this kind travel under.
    pub fn wire_type(self) -> WireType {
        match self {
            Kind::Int32 | Kind::Int64 | Kind::Bool => WireType::Varint,
            Kind::Double => WireType::Fixed64,
            Kind::String | Kind::Bytes | Kind::Object | Kind::List => WireType::Delimited,
        }
    }

    /// Human-readable name, used in error reporting.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Bool => "bool",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Object => "object",
            Kind::List => "list",
        }
    }
}

/// One decoded value.
///
/// `Object` holds the still-encoded nested body; nested decoding is the
/// reader's job and happens lazily on first typed access.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// Boolean.
    Bool(bool),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Opaque byte blob.
    Bytes(Bytes),
    /// Nested object body, not yet decoded.
    Object(Bytes),
    /// Homogeneous ordered sequence.
    List(Vec<Value>),
}

/// A single undecoded wire payload, as stored in the reader's field table.
///
/// Delimited payloads borrow from the frame buffer (cheap `Bytes` slices);
/// nothing is copied until a typed accessor asks for it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Wire type 0 payload.
    Varint(u64),
    /// Wire type 1 payload (raw bits).
    Fixed64(u64),
    /// Wire type 2 payload, length prefix already consumed.
    Delimited(Bytes),
}

impl RawValue {
    /// Wire type of this payload.
    pub fn wire_type(&self) -> WireType {
        match self {
            RawValue::Varint(_) => WireType::Varint,
            RawValue::Fixed64(_) => WireType::Fixed64,
            RawValue::Delimited(_) => WireType::Delimited,
        }
    }

    fn mismatch(&self, field: u32, expected: Kind) -> ProtoError {
        ProtoError::TypeMismatch {
            field,
            expected: expected.name(),
            found: self.wire_type().name(),
        }
    }

    /// Varint payload or `TypeMismatch`.
    pub fn expect_varint(&self, field: u32, expected: Kind) -> Result<u64> {
        match self {
            RawValue::Varint(v) => Ok(*v),
            other => Err(other.mismatch(field, expected)),
        }
    }

    /// Fixed64 payload bits or `TypeMismatch`.
    pub fn expect_fixed64(&self, field: u32, expected: Kind) -> Result<u64> {
        match self {
            RawValue::Fixed64(v) => Ok(*v),
            other => Err(other.mismatch(field, expected)),
        }
    }

    /// Delimited payload or `TypeMismatch`.
    pub fn expect_delimited(&self, field: u32, expected: Kind) -> Result<Bytes> {
        match self {
            RawValue::Delimited(b) => Ok(b.clone()),
            other => Err(other.mismatch(field, expected)),
        }
    }
}

/// Encode one payload (without its field tag) into `buf`.
///
/// Delimited payloads include their varint length prefix. Returns the wire
/// type written so the caller can build the tag. `List` is rejected here:
/// lists are emitted as repeated fields by the writer.
pub fn encode_payload(buf: &mut BytesMut, value: &Value) -> Result<WireType> {
    match value {
        Value::Int32(v) => {
            write_varint(buf, *v as i64 as u64);
            Ok(WireType::Varint)
        }
        Value::Int64(v) => {
            write_varint(buf, *v as u64);
            Ok(WireType::Varint)
        }
        Value::Bool(v) => {
            write_varint(buf, u64::from(*v));
            Ok(WireType::Varint)
        }
        Value::Double(v) => {
            buf.put_u64_le(v.to_bits());
            Ok(WireType::Fixed64)
        }
        Value::String(s) => {
            write_varint(buf, s.len() as u64);
            buf.put_slice(s.as_bytes());
            Ok(WireType::Delimited)
        }
        Value::Bytes(b) => {
            write_varint(buf, b.len() as u64);
            buf.put_slice(b);
            Ok(WireType::Delimited)
        }
        Value::Object(body) => {
            write_varint(buf, body.len() as u64);
            buf.put_slice(body);
            Ok(WireType::Delimited)
        }
        Value::List(_) => Err(ProtoError::Malformed(
            "a list is emitted as repeated fields, not a single payload".into(),
        )),
    }
}

/// Decode a raw payload into the kind the schema expects.
///
/// A wire type that does not match the expected kind is a `TypeMismatch`,
/// never a silent coercion.
pub fn decode_expected(raw: &RawValue, kind: Kind, field: u32) -> Result<Value> {
    match kind {
        Kind::Int32 => Ok(Value::Int32(raw.expect_varint(field, kind)? as i64 as i32)),
        Kind::Int64 => Ok(Value::Int64(raw.expect_varint(field, kind)? as i64)),
        Kind::Bool => Ok(Value::Bool(raw.expect_varint(field, kind)? != 0)),
        Kind::Double => Ok(Value::Double(f64::from_bits(
            raw.expect_fixed64(field, kind)?,
        ))),
        Kind::String => {
            let bytes = raw.expect_delimited(field, kind)?;
            let s = std::str::from_utf8(&bytes)
                .map_err(|_| ProtoError::Malformed(format!("field {field}: invalid UTF-8")))?;
            Ok(Value::String(s.to_owned()))
        }
        Kind::Bytes => Ok(Value::Bytes(raw.expect_delimited(field, kind)?)),
        Kind::Object => Ok(Value::Object(raw.expect_delimited(field, kind)?)),
        Kind::List => Err(ProtoError::Malformed(
            "a list is read as repeated fields, not a single payload".into(),
        )),
    }
}

/// Read one payload of the given wire type from `buf` at `*pos`.
///
/// Delimited payloads are returned as zero-copy slices of `buf`. A length
/// that runs past the end of the buffer is `TruncatedFrame`, not an
/// out-of-bounds read.
pub fn read_payload(buf: &Bytes, pos: &mut usize, wire_type: WireType) -> Result<RawValue> {
    match wire_type {
        WireType::Varint => Ok(RawValue::Varint(read_varint(buf, pos)?)),
        WireType::Fixed64 => {
            let remaining = buf.len() - *pos;
            if remaining < 8 {
                return Err(ProtoError::TruncatedFrame {
                    needed: 8,
                    remaining,
                });
            }
            let mut bits = [0u8; 8];
            bits.copy_from_slice(&buf[*pos..*pos + 8]);
            *pos += 8;
            Ok(RawValue::Fixed64(u64::from_le_bytes(bits)))
        }
        WireType::Delimited => {
            let len = read_varint(buf, pos)? as usize;
            let remaining = buf.len() - *pos;
            if len > remaining {
                return Err(ProtoError::TruncatedFrame {
                    needed: len,
                    remaining,
                });
            }
            let slice = buf.slice(*pos..*pos + len);
            *pos += len;
            Ok(RawValue::Delimited(slice))
        }
    }
}
