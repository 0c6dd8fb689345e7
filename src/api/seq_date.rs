//! Sequenced-update reply.

use bytes::Bytes;

use crate::codec::Kind;
use crate::error::Result;
use crate::message::{Call, FieldSpec, MessageType, WireObject};
use crate::protocol::{ValueReader, ValueWriter};

/// Reply carrying the sequence position and server date of an applied
/// update. Shared by every mutating request in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqDate {
    /// Sequence number of the applied update.
    pub seq: i32,
    /// Opaque update-state marker, absent on older servers.
    pub state: Option<Bytes>,
    /// Server time of the update, milliseconds since epoch.
    pub date: i64,
}

impl MessageType for SeqDate {
    const HEADER: u32 = 0x66;
    const NAME: &'static str = "SeqDate";
}

impl WireObject for SeqDate {
    fn schema(&self) -> &'static [FieldSpec] {
        const SCHEMA: &[FieldSpec] = &[
            FieldSpec::required(1, Kind::Int32, "seq"),
            FieldSpec::optional(2, Kind::Bytes, "state"),
            FieldSpec::required(3, Kind::Int64, "date"),
        ];
        SCHEMA
    }

    fn write_fields(&self, w: &mut ValueWriter) -> Result<()> {
        w.write_i32(1, self.seq);
        if let Some(state) = &self.state {
            w.write_bytes(2, state);
        }
        w.write_i64(3, self.date);
        Ok(())
    }

    fn read_fields(&mut self, r: &mut ValueReader) -> Result<()> {
        self.seq = r.get_i32(1)?;
        self.state = r.opt_bytes(2)?;
        self.date = r.get_i64(3)?;
        Ok(())
    }
}

/// Generic acknowledgement reply for requests with nothing to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoidReply;

impl MessageType for VoidReply {
    const HEADER: u32 = 0x32;
    const NAME: &'static str = "Void";
}

impl WireObject for VoidReply {
    fn schema(&self) -> &'static [FieldSpec] {
        &[]
    }

    fn write_fields(&self, _w: &mut ValueWriter) -> Result<()> {
        Ok(())
    }

    fn read_fields(&mut self, _r: &mut ValueReader) -> Result<()> {
        Ok(())
    }
}

/// Liveness probe; the peer echoes nothing back but the void ack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ping {
    /// Caller-chosen value, ignored by the peer.
    pub nonce: i64,
}

impl MessageType for Ping {
    const HEADER: u32 = 0x01;
    const NAME: &'static str = "Ping";
}

impl Call for Ping {
    type Reply = VoidReply;
}

impl WireObject for Ping {
    fn schema(&self) -> &'static [FieldSpec] {
        const SCHEMA: &[FieldSpec] = &[FieldSpec::required(1, Kind::Int64, "nonce")];
        SCHEMA
    }

    fn write_fields(&self, w: &mut ValueWriter) -> Result<()> {
        w.write_i64(1, self.nonce);
        Ok(())
    }

    fn read_fields(&mut self, r: &mut ValueReader) -> Result<()> {
        self.nonce = r.get_i64(1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{decode_body, encode_body};

    #[test]
    fn test_roundtrip_with_state() {
        let reply = SeqDate {
            seq: 41,
            state: Some(Bytes::from_static(b"\x01\x02")),
            date: 1_722_000_000_000,
        };
        let decoded: SeqDate = decode_body(encode_body(&reply).unwrap()).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn test_roundtrip_without_state() {
        let reply = SeqDate {
            seq: 1,
            state: None,
            date: 0,
        };
        let decoded: SeqDate = decode_body(encode_body(&reply).unwrap()).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn test_void_reply_is_empty_body() {
        assert!(encode_body(&VoidReply).unwrap().is_empty());
        let _: VoidReply = decode_body(Bytes::new()).unwrap();
    }
}
