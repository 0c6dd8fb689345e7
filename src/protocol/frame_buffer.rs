//! Frame buffer for accumulating partial reads.
//!
//! Byte-stream transports deliver arbitrary fragments; this buffer
//! accumulates them and yields complete frames. Implements a state machine
//! over the varint length prefix:
//! - `WaitingForLength`: need the full length varint
//! - `WaitingForContent`: length parsed, need that many more bytes
//!
//! Uses `bytes::BytesMut` so extracted frame bodies are zero-copy slices
//! of the accumulation buffer.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use tagwire::protocol::{Frame, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//! let wire = Frame::new(0xae5, Bytes::from_static(b"\x08\x01")).encode();
//!
//! let frames = buffer.push(&wire).unwrap();
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].header, 0xae5);
//! ```

use bytes::BytesMut;

use super::frame::{Frame, DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE};
use crate::codec::varint::peek_varint;
use crate::error::{ProtoError, Result};

/// State machine for frame extraction.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for a complete length varint.
    WaitingForLength,
    /// Length parsed, waiting for `remaining` content bytes.
    WaitingForContent { remaining: usize },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from transport reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum accepted frame content length.
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Create a frame buffer with the default size limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a frame buffer with a custom size limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(16 * 1024),
            state: State::WaitingForLength,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is buffered internally for the next push; the decoder
    /// is never handed an incomplete frame.
    ///
    /// # Errors
    ///
    /// `Malformed` on an invalid or oversized length prefix; the limit is
    /// checked before any content is buffered for the frame.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match self.state {
            State::WaitingForLength => {
                let (content_len, varint_len) = match peek_varint(&self.buffer)? {
                    Some(parsed) => parsed,
                    None => return Ok(None),
                };
                let content_len = content_len as usize;

                if content_len < HEADER_SIZE {
                    return Err(ProtoError::Malformed(format!(
                        "frame length {content_len} shorter than header"
                    )));
                }
                if content_len > self.max_frame_size {
                    return Err(ProtoError::Malformed(format!(
                        "frame length {content_len} exceeds maximum {}",
                        self.max_frame_size
                    )));
                }

                let _ = self.buffer.split_to(varint_len);
                self.state = State::WaitingForContent {
                    remaining: content_len,
                };
                self.try_extract_one()
            }

            State::WaitingForContent { remaining } => {
                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let content = self.buffer.split_to(remaining).freeze();
                self.state = State::WaitingForLength;

                let header = u32::from_le_bytes([content[0], content[1], content[2], content[3]]);
                Ok(Some(Frame::new(header, content.slice(HEADER_SIZE..))))
            }
        }
    }

    /// Number of buffered bytes not yet part of an extracted frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForLength;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn wire(header: u32, body: &'static [u8]) -> Bytes {
        Frame::new(header, Bytes::from_static(body)).encode()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&wire(0xae5, b"\x08\x01")).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header, 0xae5);
        assert_eq!(&frames[0].body[..], b"\x08\x01");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();
        let mut data = Vec::new();
        data.extend_from_slice(&wire(1, b"first"));
        data.extend_from_slice(&wire(2, b"second"));
        data.extend_from_slice(&wire(3, b""));

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].header, 1);
        assert_eq!(frames[1].header, 2);
        assert_eq!(frames[2].header, 3);
        assert!(frames[2].body.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let data = wire(0x42, b"fragmented delivery");

        let mut extracted = Vec::new();
        for byte in &data[..] {
            extracted.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].header, 0x42);
        assert_eq!(&extracted[0].body[..], b"fragmented delivery");
    }

    #[test]
    fn test_split_across_length_prefix() {
        // Body long enough that the length varint takes two bytes.
        let body = vec![0xAB; 300];
        let data = Frame::new(9, Bytes::from(body.clone())).encode();

        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(&data[..1]).unwrap().is_empty());
        let frames = buffer.push(&data[1..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].body[..], &body[..]);
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();
        let first = wire(1, b"first");
        let second = wire(2, b"second");

        let mut data = first.to_vec();
        data.extend_from_slice(&second[..3]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header, 1);

        let frames = buffer.push(&second[3..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header, 2);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buffer = FrameBuffer::with_max_frame_size(64);
        let body = vec![0u8; 128];
        let data = Frame::new(1, Bytes::from(body)).encode();
        assert!(matches!(
            buffer.push(&data),
            Err(ProtoError::Malformed(_))
        ));
    }

    #[test]
    fn test_undersized_length_rejected() {
        let mut buffer = FrameBuffer::new();
        // Declared length 2 cannot hold the 4-byte header.
        assert!(buffer.push(&[2, 0xAA, 0xBB]).is_err());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        let data = wire(1, b"some payload");
        buffer.push(&data[..6]).unwrap();
        assert!(!buffer.is_empty());

        buffer.clear();
        assert!(buffer.is_empty());

        // A fresh frame parses cleanly after the reset.
        let frames = buffer.push(&wire(2, b"ok")).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header, 2);
    }
}
