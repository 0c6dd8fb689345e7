//! Frame encoding and decoding.
//!
//! The wire unit is:
//!
//! ```text
//! Frame := VarintLength(BodyLength) Header:u32 LE Body:Bytes[BodyLength-4]
//! ```
//!
//! The length prefix counts the 4-byte header plus the body, so receivers
//! can frame-split a byte stream before decoding anything. The header is a
//! fixed numeric code identifying the message's schema; the body is the
//! field-tagged payload produced by the value writer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::varint::{read_varint, varint_len, write_varint};
use crate::error::{ProtoError, Result};

/// Bytes the header code occupies inside the length-counted region.
pub const HEADER_SIZE: usize = 4;

/// Default maximum frame length accepted from a peer (16 MB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A complete protocol frame: header code plus undecoded body.
///
/// The body is a zero-copy `Bytes` slice of the received buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Numeric message type code.
    pub header: u32,
    /// Field-tagged payload, not yet decoded.
    pub body: Bytes,
}

impl Frame {
    /// Create a frame from parts.
    pub fn new(header: u32, body: Bytes) -> Self {
        Self { header, body }
    }

    /// Encode into a single contiguous buffer.
    pub fn encode(&self) -> Bytes {
        let content_len = HEADER_SIZE + self.body.len();
        let mut buf = BytesMut::with_capacity(varint_len(content_len as u64) + content_len);
        write_varint(&mut buf, content_len as u64);
        buf.put_u32_le(self.header);
        buf.put_slice(&self.body);
        buf.freeze()
    }

    /// Decode a complete frame.
    ///
    /// The input must contain exactly one frame; trailing bytes are a
    /// `Malformed` error (a complete frame decodes deterministically to
    /// exactly one message or fails).
    pub fn decode(bytes: Bytes) -> Result<Self> {
        let mut pos = 0;
        let declared = read_varint(&bytes, &mut pos)? as usize;
        let remaining = bytes.len() - pos;

        if declared < HEADER_SIZE {
            return Err(ProtoError::Malformed(format!(
                "frame length {declared} shorter than header"
            )));
        }
        if declared > remaining {
            return Err(ProtoError::TruncatedFrame {
                needed: declared,
                remaining,
            });
        }
        if declared < remaining {
            return Err(ProtoError::Malformed(format!(
                "{} trailing bytes after frame",
                remaining - declared
            )));
        }

        let header = u32::from_le_bytes([
            bytes[pos],
            bytes[pos + 1],
            bytes[pos + 2],
            bytes[pos + 3],
        ]);
        let body = bytes.slice(pos + HEADER_SIZE..);
        Ok(Self { header, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = Frame::new(0xae5, Bytes::from_static(b"\x08\x01"));
        let decoded = Frame::decode(frame.encode()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_layout_is_bit_exact() {
        let frame = Frame::new(0xae5, Bytes::from_static(b"\xAB\xCD"));
        let bytes = frame.encode();
        // Length 6 fits one varint byte; header 0xae5 little-endian.
        assert_eq!(&bytes[..], &[6, 0xE5, 0x0A, 0x00, 0x00, 0xAB, 0xCD]);
    }

    #[test]
    fn test_empty_body() {
        let frame = Frame::new(0x10, Bytes::new());
        let bytes = frame.encode();
        assert_eq!(&bytes[..], &[4, 0x10, 0, 0, 0]);
        assert_eq!(Frame::decode(bytes).unwrap(), frame);
    }

    #[test]
    fn test_truncated_rejected() {
        let bytes = Frame::new(1, Bytes::from_static(b"abcd")).encode();
        let cut = bytes.slice(..bytes.len() - 1);
        assert!(matches!(
            Frame::decode(cut),
            Err(ProtoError::TruncatedFrame { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut buf = BytesMut::new();
        buf.put_slice(&Frame::new(1, Bytes::new()).encode());
        buf.put_u8(0xFF);
        assert!(matches!(
            Frame::decode(buf.freeze()),
            Err(ProtoError::Malformed(_))
        ));
    }

    #[test]
    fn test_length_below_header_rejected() {
        // Declared length 2 cannot hold the 4-byte header.
        let bytes = Bytes::from_static(&[2, 0x01, 0x00]);
        assert!(matches!(
            Frame::decode(bytes),
            Err(ProtoError::Malformed(_))
        ));
    }
}
