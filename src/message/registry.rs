//! Message registry - header code to factory mapping.
//!
//! Populated once at process startup with every generated message type,
//! then treated as read-only: lookups after startup take no lock. A
//! duplicate header is a configuration error in the generated catalog and
//! [`MessageRegistry::register`] treats it as fatal; dispatch-time
//! problems (unknown header, malformed body) are ordinary errors the
//! caller logs and drops.
//!
//! # Example
//!
//! ```
//! use tagwire::api::{SeqDate, TransferOwnership};
//! use tagwire::message::MessageRegistry;
//!
//! let mut registry = MessageRegistry::new();
//! registry.register_call::<TransferOwnership>();
//! registry.register::<SeqDate>();
//!
//! assert!(registry.resolve(0xae5).is_ok());
//! assert!(registry.resolve(0xdead).is_err());
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use super::catalog::{Catalog, CatalogEntry};
use super::{Call, MessageType, WireMessage};
use crate::error::{ProtoError, Result};
use crate::protocol::{Frame, ValueReader};

/// One registered message type.
struct RegisteredType {
    /// Type name for diagnostics and the catalog.
    name: &'static str,
    /// Declared reply header, for request types.
    reply: Option<u32>,
    /// Constructs the empty shell to be populated by the reader.
    factory: fn() -> Box<dyn WireMessage>,
}

/// Mapping from fixed numeric headers to message factories.
#[derive(Default)]
pub struct MessageRegistry {
    types: HashMap<u32, RegisteredType>,
}

impl MessageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message type.
    ///
    /// # Panics
    ///
    /// On a duplicate header: the catalog is broken and the process
    /// cannot safely dispatch, so startup must not proceed.
    pub fn register<M: MessageType>(&mut self) {
        if let Err(e) = self.try_register::<M>() {
            panic!("message registry misconfigured: {e}");
        }
    }

    /// Register a request type, recording its declared reply pairing.
    ///
    /// The reply type itself is registered separately (many requests may
    /// share one reply type).
    ///
    /// # Panics
    ///
    /// On a duplicate header, as [`register`](Self::register).
    pub fn register_call<C: Call>(&mut self) {
        if let Err(e) = self.try_register_entry::<C>(Some(C::Reply::HEADER)) {
            panic!("message registry misconfigured: {e}");
        }
    }

    /// Fallible registration for dynamically assembled registries.
    pub fn try_register<M: MessageType>(&mut self) -> Result<()> {
        self.try_register_entry::<M>(None)
    }

    fn try_register_entry<M: MessageType>(&mut self, reply: Option<u32>) -> Result<()> {
        if self.types.contains_key(&M::HEADER) {
            return Err(ProtoError::DuplicateHeader(M::HEADER));
        }
        self.types.insert(
            M::HEADER,
            RegisteredType {
                name: M::NAME,
                reply,
                factory: || Box::new(M::default()),
            },
        );
        Ok(())
    }

    /// Look up a header, or `UnknownHeader`.
    pub fn resolve(&self, header: u32) -> Result<&'static str> {
        self.types
            .get(&header)
            .map(|t| t.name)
            .ok_or(ProtoError::UnknownHeader(header))
    }

    /// Construct the empty shell for a header.
    pub fn new_shell(&self, header: u32) -> Result<Box<dyn WireMessage>> {
        let entry = self
            .types
            .get(&header)
            .ok_or(ProtoError::UnknownHeader(header))?;
        Ok((entry.factory)())
    }

    /// Declared reply header for a request type, if any.
    pub fn expected_reply(&self, header: u32) -> Option<u32> {
        self.types.get(&header).and_then(|t| t.reply)
    }

    /// Decode a complete frame into a fully typed message.
    ///
    /// Resolves the header, instantiates the shell, and populates it from
    /// the body. Every failure is an ordinary `Err`; a bad frame never
    /// takes the connection down.
    pub fn decode_frame(&self, bytes: Bytes) -> Result<Box<dyn WireMessage>> {
        self.decode(Frame::decode(bytes)?)
    }

    /// Decode an already frame-split [`Frame`].
    pub fn decode(&self, frame: Frame) -> Result<Box<dyn WireMessage>> {
        let mut shell = self.new_shell(frame.header)?;
        let mut reader = ValueReader::parse(frame.body)?;
        shell.read_fields(&mut reader)?;
        tracing::trace!(header = frame.header, name = shell.type_name(), "decoded frame");
        Ok(shell)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Snapshot of the registered catalog, sorted by header.
    pub fn catalog(&self) -> Catalog {
        let mut entries: Vec<CatalogEntry> = self
            .types
            .iter()
            .map(|(&header, t)| CatalogEntry {
                name: t.name,
                header,
                reply: t.reply,
            })
            .collect();
        entries.sort_by_key(|e| e.header);
        Catalog { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SeqDate, TransferOwnership};
    use crate::message::encode_frame;

    fn registry() -> MessageRegistry {
        let mut registry = MessageRegistry::new();
        registry.register_call::<TransferOwnership>();
        registry.register::<SeqDate>();
        registry
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let registry = registry();
        assert_eq!(registry.resolve(0xae5).unwrap(), "TransferOwnership");
        assert!(matches!(
            registry.resolve(0xdead),
            Err(ProtoError::UnknownHeader(0xdead))
        ));
    }

    #[test]
    #[should_panic(expected = "duplicate header")]
    fn test_duplicate_registration_is_fatal() {
        let mut registry = registry();
        registry.register::<SeqDate>();
    }

    #[test]
    fn test_try_register_reports_duplicate() {
        let mut registry = registry();
        assert!(matches!(
            registry.try_register::<SeqDate>(),
            Err(ProtoError::DuplicateHeader(h)) if h == SeqDate::HEADER
        ));
    }

    #[test]
    fn test_reply_pairing_recorded() {
        let registry = registry();
        assert_eq!(
            registry.expected_reply(TransferOwnership::HEADER),
            Some(SeqDate::HEADER)
        );
        assert_eq!(registry.expected_reply(SeqDate::HEADER), None);
    }

    #[test]
    fn test_decode_frame_unknown_header() {
        let registry = registry();
        let frame = Frame::new(0x9999, Bytes::new()).encode();
        assert!(matches!(
            registry.decode_frame(frame),
            Err(ProtoError::UnknownHeader(0x9999))
        ));
    }

    #[test]
    fn test_decode_frame_roundtrip() {
        let registry = registry();
        let reply = SeqDate {
            seq: 12,
            state: None,
            date: 1_700_000_000_000,
        };
        let decoded = registry.decode_frame(encode_frame(&reply).unwrap()).unwrap();
        assert_eq!(decoded.header_code(), SeqDate::HEADER);
        let decoded = decoded.into_any().downcast::<SeqDate>().unwrap();
        assert_eq!(*decoded, reply);
    }

    #[test]
    fn test_catalog_snapshot() {
        let catalog = registry().catalog();
        assert_eq!(catalog.entries.len(), 2);
        assert!(catalog
            .entries
            .iter()
            .any(|e| e.header == 0xae5 && e.reply == Some(SeqDate::HEADER)));
    }
}
