//! Message module - the generated-code boundary.
//!
//! Generated message types plug into the codec through three traits:
//!
//! - [`WireObject`] - anything with numbered fields: a schema, a
//!   `write_fields` that feeds a [`ValueWriter`], and a `read_fields` that
//!   drains a [`ValueReader`]. Nested objects implement only this.
//! - [`WireMessage`] - a top-level object that also carries its fixed
//!   numeric header code. These are what the registry constructs and the
//!   dispatcher hands around as `Box<dyn WireMessage>`.
//! - [`Call`] - a request message with its declared reply type.
//!
//! Required fields are plain values in generated structs and optional
//! fields are `Option<T>`, so a missing required field is a construction
//! error, not a runtime surprise; the writer's schema validation still
//! backstops dynamically assembled bodies.
//!
//! # Example
//!
//! ```
//! use tagwire::codec::Kind;
//! use tagwire::message::{encode_body, decode_body, FieldSpec, WireObject};
//! use tagwire::protocol::{ValueReader, ValueWriter};
//! use tagwire::Result;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Ping { nonce: i64 }
//!
//! impl WireObject for Ping {
//!     fn schema(&self) -> &'static [FieldSpec] {
//!         const SCHEMA: &[FieldSpec] = &[FieldSpec::required(1, Kind::Int64, "nonce")];
//!         SCHEMA
//!     }
//!     fn write_fields(&self, w: &mut ValueWriter) -> Result<()> {
//!         w.write_i64(1, self.nonce);
//!         Ok(())
//!     }
//!     fn read_fields(&mut self, r: &mut ValueReader) -> Result<()> {
//!         self.nonce = r.get_i64(1)?;
//!         Ok(())
//!     }
//! }
//!
//! let body = encode_body(&Ping { nonce: 7 }).unwrap();
//! let decoded: Ping = decode_body(body).unwrap();
//! assert_eq!(decoded, Ping { nonce: 7 });
//! ```

mod catalog;
mod registry;

pub use catalog::{Catalog, CatalogEntry};
pub use registry::MessageRegistry;

use std::any::Any;
use std::fmt;

use bytes::Bytes;

use crate::codec::Kind;
use crate::error::Result;
use crate::protocol::{Frame, ValueReader, ValueWriter};

/// Schema entry for one field of a message type.
///
/// Generated code declares these as `const` slices; the writer uses them
/// to enforce required fields before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field number, unique within the message type.
    pub number: u32,
    /// Declared kind.
    pub kind: Kind,
    /// Whether serialization must fail when the field is absent.
    pub required: bool,
    /// Field name, used in error messages.
    pub name: &'static str,
}

impl FieldSpec {
    /// A required field.
    pub const fn required(number: u32, kind: Kind, name: &'static str) -> Self {
        Self {
            number,
            kind,
            required: true,
            name,
        }
    }

    /// An optional field.
    pub const fn optional(number: u32, kind: Kind, name: &'static str) -> Self {
        Self {
            number,
            kind,
            required: false,
            name,
        }
    }
}

/// An object with numbered, typed fields.
pub trait WireObject: fmt::Debug + Send + 'static {
    /// Field schema: numbers, kinds, required flags.
    fn schema(&self) -> &'static [FieldSpec];

    /// Write every present field into the writer.
    fn write_fields(&self, w: &mut ValueWriter) -> Result<()>;

    /// Populate this shell from a parsed field table.
    fn read_fields(&mut self, r: &mut ValueReader) -> Result<()>;
}

/// A top-level message: an object plus its fixed numeric header.
///
/// Implemented automatically for every [`MessageType`]; generated code
/// never writes this by hand.
pub trait WireMessage: WireObject + Any {
    /// The header code identifying this type on the wire.
    fn header_code(&self) -> u32;

    /// Type name for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Upcast for the typed downcast at the reply boundary.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Static identity of a message type: what the registry needs to build
/// shells for it.
pub trait MessageType: WireObject + Default {
    /// Fixed numeric header, unique per catalog, never reused.
    const HEADER: u32;
    /// Type name for the catalog and diagnostics.
    const NAME: &'static str;
}

impl<M: MessageType> WireMessage for M {
    fn header_code(&self) -> u32 {
        M::HEADER
    }

    fn type_name(&self) -> &'static str {
        M::NAME
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A request message with its declared reply type.
pub trait Call: MessageType {
    /// The message type the peer answers this request with.
    type Reply: MessageType;
}

/// Serialize an object's fields into a body, validating its schema.
///
/// Fails with `MissingRequiredField` before producing any bytes.
pub fn encode_body(obj: &dyn WireObject) -> Result<Bytes> {
    let mut writer = ValueWriter::with_schema(obj.schema());
    obj.write_fields(&mut writer)?;
    writer.finish()
}

/// Decode a body into a typed shell. Mostly useful in tests; dispatch
/// goes through [`MessageRegistry::decode_frame`].
pub fn decode_body<T: WireObject + Default>(body: Bytes) -> Result<T> {
    let mut reader = ValueReader::parse(body)?;
    let mut shell = T::default();
    shell.read_fields(&mut reader)?;
    Ok(shell)
}

/// Encode a complete wire frame for a message: length prefix, header
/// code, body.
pub fn encode_frame(msg: &dyn WireMessage) -> Result<Bytes> {
    let mut writer = ValueWriter::with_schema(msg.schema());
    msg.write_fields(&mut writer)?;
    let body = writer.finish()?;
    Ok(Frame::new(msg.header_code(), body).encode())
}
