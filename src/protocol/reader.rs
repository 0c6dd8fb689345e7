//! Value reader - random-access field table over a received body.
//!
//! `parse()` walks the body once, O(body size), recording every field
//! occurrence as an undecoded span; nothing nested is decoded eagerly.
//! Typed accessors then extract values on demand:
//!
//! - scalar accessors read the *last* occurrence (duplicates
//!   overwrite-last-wins)
//! - list accessors read every occurrence in wire order (duplicates
//!   append)
//! - nested bodies are parsed on first access and memoized per field
//!   number, so re-reading a field never repeats the decode work
//!
//! A field number present on the wire but never asked for is simply
//! ignored; newer producers may add fields unknown to older consumers.
//!
//! # Example
//!
//! ```
//! use tagwire::protocol::{ValueReader, ValueWriter};
//!
//! let mut writer = ValueWriter::new();
//! writer.write_i32(1, 7);
//! writer.write_string(3, "hi");
//! let body = writer.finish().unwrap();
//!
//! let reader = ValueReader::parse(body).unwrap();
//! assert_eq!(reader.get_i32(1).unwrap(), 7);
//! assert_eq!(reader.opt_string(2)?, None);      // absent optional
//! assert_eq!(reader.get_string(3).unwrap(), "hi");
//! # Ok::<(), tagwire::ProtoError>(())
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use super::tag::split_tag;
use crate::codec::varint::read_varint;
use crate::codec::{decode_expected, read_payload, Kind, RawValue, Value};
use crate::error::{ProtoError, Result};
use crate::message::WireObject;

/// Random-access field table over one message body.
#[derive(Debug, Default)]
pub struct ValueReader {
    /// Every occurrence of every field, in wire order.
    fields: HashMap<u32, Vec<RawValue>>,
    /// Parsed nested bodies, memoized per field number.
    nested: HashMap<u32, Vec<ValueReader>>,
}

impl ValueReader {
    /// Parse a body into a field table in a single pass.
    ///
    /// Delimited spans are zero-copy slices of `body`; nested objects are
    /// not decoded here.
    pub fn parse(body: Bytes) -> Result<Self> {
        let mut fields: HashMap<u32, Vec<RawValue>> = HashMap::new();
        let mut pos = 0;

        while pos < body.len() {
            let tag = read_varint(&body, &mut pos)?;
            let (field, wire_type) = split_tag(tag)?;
            let payload = read_payload(&body, &mut pos, wire_type)?;
            fields.entry(field).or_default().push(payload);
        }

        Ok(Self {
            fields,
            nested: HashMap::new(),
        })
    }

    /// Whether the body carried `field` at all.
    pub fn contains(&self, field: u32) -> bool {
        self.fields.contains_key(&field)
    }

    /// Field numbers present in the body.
    pub fn field_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    fn last(&self, field: u32) -> Option<&RawValue> {
        self.fields.get(&field).and_then(|entries| entries.last())
    }

    fn required(&self, field: u32) -> Result<&RawValue> {
        self.last(field)
            .ok_or_else(|| ProtoError::MissingRequiredField(format!("#{field}")))
    }

    /// Required 32-bit integer.
    pub fn get_i32(&self, field: u32) -> Result<i32> {
        Ok(self.required(field)?.expect_varint(field, Kind::Int32)? as i64 as i32)
    }

    /// Optional 32-bit integer; absent yields `None`.
    pub fn opt_i32(&self, field: u32) -> Result<Option<i32>> {
        match self.last(field) {
            Some(raw) => Ok(Some(raw.expect_varint(field, Kind::Int32)? as i64 as i32)),
            None => Ok(None),
        }
    }

    /// Optional 32-bit integer with a default; absence never fails.
    pub fn i32_or(&self, field: u32, default: i32) -> Result<i32> {
        Ok(self.opt_i32(field)?.unwrap_or(default))
    }

    /// Required 64-bit integer.
    pub fn get_i64(&self, field: u32) -> Result<i64> {
        Ok(self.required(field)?.expect_varint(field, Kind::Int64)? as i64)
    }

    /// Optional 64-bit integer; absent yields `None`.
    pub fn opt_i64(&self, field: u32) -> Result<Option<i64>> {
        match self.last(field) {
            Some(raw) => Ok(Some(raw.expect_varint(field, Kind::Int64)? as i64)),
            None => Ok(None),
        }
    }

    /// Optional 64-bit integer with a default; absence never fails.
    pub fn i64_or(&self, field: u32, default: i64) -> Result<i64> {
        Ok(self.opt_i64(field)?.unwrap_or(default))
    }

    /// Required boolean.
    pub fn get_bool(&self, field: u32) -> Result<bool> {
        Ok(self.required(field)?.expect_varint(field, Kind::Bool)? != 0)
    }

    /// Optional boolean with a default; absence never fails.
    pub fn bool_or(&self, field: u32, default: bool) -> Result<bool> {
        match self.last(field) {
            Some(raw) => Ok(raw.expect_varint(field, Kind::Bool)? != 0),
            None => Ok(default),
        }
    }

    /// Required double.
    pub fn get_f64(&self, field: u32) -> Result<f64> {
        Ok(f64::from_bits(
            self.required(field)?.expect_fixed64(field, Kind::Double)?,
        ))
    }

    /// Required UTF-8 string.
    pub fn get_string(&self, field: u32) -> Result<String> {
        decode_string(self.required(field)?, field)
    }

    /// Optional UTF-8 string; absent yields `None`.
    pub fn opt_string(&self, field: u32) -> Result<Option<String>> {
        self.last(field).map(|raw| decode_string(raw, field)).transpose()
    }

    /// Required byte blob.
    pub fn get_bytes(&self, field: u32) -> Result<Bytes> {
        self.required(field)?.expect_delimited(field, Kind::Bytes)
    }

    /// Optional byte blob; absent yields `None`.
    pub fn opt_bytes(&self, field: u32) -> Result<Option<Bytes>> {
        self.last(field)
            .map(|raw| raw.expect_delimited(field, Kind::Bytes))
            .transpose()
    }

    /// Required nested object, decoded into a fresh shell.
    ///
    /// The nested body is parsed on first access and cached, so repeated
    /// reads of the same field decode from the memoized table.
    pub fn get_object<T: WireObject + Default>(&mut self, field: u32) -> Result<T> {
        self.opt_object(field)?
            .ok_or_else(|| ProtoError::MissingRequiredField(format!("#{field}")))
    }

    /// Optional nested object; absent yields `None`.
    pub fn opt_object<T: WireObject + Default>(&mut self, field: u32) -> Result<Option<T>> {
        if !self.contains(field) {
            return Ok(None);
        }
        self.ensure_nested(field)?;
        let readers = self
            .nested
            .get_mut(&field)
            .expect("nested cache populated above");
        let reader = readers.last_mut().expect("non-empty by contains check");
        let mut shell = T::default();
        shell.read_fields(reader)?;
        Ok(Some(shell))
    }

    /// Ordered list of nested objects: every occurrence of `field`, in
    /// wire order. Absent yields an empty list.
    pub fn get_list<T: WireObject + Default>(&mut self, field: u32) -> Result<Vec<T>> {
        if !self.contains(field) {
            return Ok(Vec::new());
        }
        self.ensure_nested(field)?;
        let readers = self
            .nested
            .get_mut(&field)
            .expect("nested cache populated above");
        let mut items = Vec::with_capacity(readers.len());
        for reader in readers.iter_mut() {
            let mut shell = T::default();
            shell.read_fields(reader)?;
            items.push(shell);
        }
        Ok(items)
    }

    /// Every occurrence of a repeated 32-bit integer field.
    pub fn get_repeated_i32(&self, field: u32) -> Result<Vec<i32>> {
        self.repeated(field, |raw| {
            Ok(raw.expect_varint(field, Kind::Int32)? as i64 as i32)
        })
    }

    /// Every occurrence of a repeated 64-bit integer field.
    pub fn get_repeated_i64(&self, field: u32) -> Result<Vec<i64>> {
        self.repeated(field, |raw| Ok(raw.expect_varint(field, Kind::Int64)? as i64))
    }

    /// Every occurrence of a repeated string field.
    pub fn get_repeated_string(&self, field: u32) -> Result<Vec<String>> {
        self.repeated(field, |raw| decode_string(raw, field))
    }

    /// Every occurrence of a repeated bytes field.
    pub fn get_repeated_bytes(&self, field: u32) -> Result<Vec<Bytes>> {
        self.repeated(field, |raw| raw.expect_delimited(field, Kind::Bytes))
    }

    /// Dynamically typed access: decode `field` as the declared kind.
    ///
    /// `Kind::List` collects every occurrence as a still-encoded
    /// `Value::Object` element.
    pub fn get_value(&self, field: u32, kind: Kind) -> Result<Value> {
        if kind == Kind::List {
            let items = self.repeated(field, |raw| {
                Ok(Value::Object(raw.expect_delimited(field, Kind::Object)?))
            })?;
            return Ok(Value::List(items));
        }
        decode_expected(self.required(field)?, kind, field)
    }

    fn repeated<T>(&self, field: u32, mut decode: impl FnMut(&RawValue) -> Result<T>) -> Result<Vec<T>> {
        match self.fields.get(&field) {
            Some(entries) => entries.iter().map(|raw| decode(raw)).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Parse and memoize every nested body under `field`.
    fn ensure_nested(&mut self, field: u32) -> Result<()> {
        if self.nested.contains_key(&field) {
            return Ok(());
        }
        let entries = self.fields.get(&field).expect("caller checked contains");
        let mut readers = Vec::with_capacity(entries.len());
        for raw in entries {
            let body = raw.expect_delimited(field, Kind::Object)?;
            readers.push(ValueReader::parse(body)?);
        }
        self.nested.insert(field, readers);
        Ok(())
    }
}

fn decode_string(raw: &RawValue, field: u32) -> Result<String> {
    let bytes = raw.expect_delimited(field, Kind::String)?;
    let s = std::str::from_utf8(&bytes)
        .map_err(|_| ProtoError::Malformed(format!("field {field}: invalid UTF-8")))?;
    Ok(s.to_owned())
}
