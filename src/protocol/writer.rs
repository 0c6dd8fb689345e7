//! Value writer - builds a field-tagged body from typed, numbered fields.
//!
//! Fields may be written in any order; scalar writes to the same number
//! overwrite (last wins), repeated writes append. `finish()` validates the
//! message schema's required fields before emitting a single byte, then
//! serializes in ascending field-number order so re-serialization of equal
//! messages is byte-identical.
//!
//! The writer holds no state after `finish()`; each message gets its own
//! writer.
//!
//! # Example
//!
//! ```
//! use tagwire::protocol::ValueWriter;
//!
//! let mut writer = ValueWriter::new();
//! writer.write_i32(1, 42);
//! writer.write_string(2, "hello");
//! let body = writer.finish().unwrap();
//! assert_eq!(&body[..], &[0x08, 42, 0x12, 5, b'h', b'e', b'l', b'l', b'o']);
//! ```

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use super::tag::pack_tag;
use crate::codec::varint::write_varint;
use crate::codec::{RawValue, Value};
use crate::error::{ProtoError, Result};
use crate::message::{FieldSpec, WireObject};

/// One field slot: a scalar value or an append-only repeated field.
#[derive(Debug, Clone)]
enum Slot {
    Single(RawValue),
    Repeated(Vec<RawValue>),
}

/// Builder for a field-tagged message body.
#[derive(Debug, Default)]
pub struct ValueWriter {
    schema: &'static [FieldSpec],
    fields: BTreeMap<u32, Slot>,
}

impl ValueWriter {
    /// Create a writer without schema validation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer that validates `schema`'s required fields at
    /// `finish()`.
    pub fn with_schema(schema: &'static [FieldSpec]) -> Self {
        Self {
            schema,
            fields: BTreeMap::new(),
        }
    }

    fn set(&mut self, field: u32, payload: RawValue) {
        self.fields.insert(field, Slot::Single(payload));
    }

    fn append(&mut self, field: u32, payload: RawValue) {
        match self.fields.get_mut(&field) {
            Some(Slot::Repeated(items)) => items.push(payload),
            _ => {
                self.fields.insert(field, Slot::Repeated(vec![payload]));
            }
        }
    }

    /// Write a 32-bit integer field.
    pub fn write_i32(&mut self, field: u32, value: i32) {
        self.set(field, RawValue::Varint(value as i64 as u64));
    }

    /// Write a 64-bit integer field.
    pub fn write_i64(&mut self, field: u32, value: i64) {
        self.set(field, RawValue::Varint(value as u64));
    }

    /// Write a boolean field.
    pub fn write_bool(&mut self, field: u32, value: bool) {
        self.set(field, RawValue::Varint(u64::from(value)));
    }

    /// Write a double field.
    pub fn write_f64(&mut self, field: u32, value: f64) {
        self.set(field, RawValue::Fixed64(value.to_bits()));
    }

    /// Write a UTF-8 string field.
    pub fn write_string(&mut self, field: u32, value: &str) {
        self.set(field, RawValue::Delimited(Bytes::copy_from_slice(value.as_bytes())));
    }

    /// Write an opaque byte blob field.
    pub fn write_bytes(&mut self, field: u32, value: &[u8]) {
        self.set(field, RawValue::Delimited(Bytes::copy_from_slice(value)));
    }

    /// Write a nested object field.
    ///
    /// The object is serialized immediately (its own required fields are
    /// validated at this point), so a later mutation of `value` does not
    /// affect this writer.
    pub fn write_object(&mut self, field: u32, value: &dyn WireObject) -> Result<()> {
        let body = crate::message::encode_body(value)?;
        self.set(field, RawValue::Delimited(body));
        Ok(())
    }

    /// Append one element to a repeated object field.
    pub fn append_object(&mut self, field: u32, value: &dyn WireObject) -> Result<()> {
        let body = crate::message::encode_body(value)?;
        self.append(field, RawValue::Delimited(body));
        Ok(())
    }

    /// Write a whole list field: clears the slot, then appends every
    /// element in order.
    pub fn write_object_list<'a, I>(&mut self, field: u32, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a dyn WireObject>,
    {
        self.fields.insert(field, Slot::Repeated(Vec::new()));
        for value in values {
            self.append_object(field, value)?;
        }
        Ok(())
    }

    /// Write a dynamically typed value. `Value::List` expands into an
    /// append-per-element repeated field.
    pub fn write_value(&mut self, field: u32, value: &Value) -> Result<()> {
        match value {
            Value::List(items) => {
                self.fields.insert(field, Slot::Repeated(Vec::new()));
                for item in items {
                    let payload = raw_from_value(item)?;
                    self.append(field, payload);
                }
                Ok(())
            }
            other => {
                self.set(field, raw_from_value(other)?);
                Ok(())
            }
        }
    }

    /// Whether any value has been written for `field`.
    pub fn contains(&self, field: u32) -> bool {
        self.fields.contains_key(&field)
    }

    /// Validate required fields and emit the body.
    ///
    /// On `MissingRequiredField` no bytes are produced at all; a partial
    /// frame is never observable.
    pub fn finish(self) -> Result<Bytes> {
        for spec in self.schema {
            if spec.required && !self.fields.contains_key(&spec.number) {
                return Err(ProtoError::MissingRequiredField(spec.name.to_owned()));
            }
        }

        let mut buf = BytesMut::new();
        for (field, slot) in &self.fields {
            match slot {
                Slot::Single(payload) => emit_field(&mut buf, *field, payload),
                Slot::Repeated(items) => {
                    for payload in items {
                        emit_field(&mut buf, *field, payload);
                    }
                }
            }
        }
        Ok(buf.freeze())
    }
}

fn raw_from_value(value: &Value) -> Result<RawValue> {
    match value {
        Value::Int32(v) => Ok(RawValue::Varint(*v as i64 as u64)),
        Value::Int64(v) => Ok(RawValue::Varint(*v as u64)),
        Value::Bool(v) => Ok(RawValue::Varint(u64::from(*v))),
        Value::Double(v) => Ok(RawValue::Fixed64(v.to_bits())),
        Value::String(s) => Ok(RawValue::Delimited(Bytes::copy_from_slice(s.as_bytes()))),
        Value::Bytes(b) => Ok(RawValue::Delimited(b.clone())),
        Value::Object(b) => Ok(RawValue::Delimited(b.clone())),
        Value::List(_) => Err(ProtoError::Malformed(
            "nested lists are not supported".into(),
        )),
    }
}

fn emit_field(buf: &mut BytesMut, field: u32, payload: &RawValue) {
    write_varint(buf, pack_tag(field, payload.wire_type()));
    match payload {
        RawValue::Varint(v) => write_varint(buf, *v),
        RawValue::Fixed64(v) => buf.put_u64_le(*v),
        RawValue::Delimited(b) => {
            write_varint(buf, b.len() as u64);
            buf.put_slice(b);
        }
    }
}
