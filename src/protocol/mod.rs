//! Protocol module - field tags, framing, and the body writer/reader.
//!
//! This layer turns typed fields into wire frames and back:
//! - field tag packing (`(number << 3) | wire_type`)
//! - [`ValueWriter`] builds a validated, deterministic body
//! - [`ValueReader`] exposes a received body as a random-access field table
//! - [`Frame`] is the length-prefixed wire unit
//! - [`FrameBuffer`] frame-splits a byte stream for stream transports

pub mod tag;

mod frame;
mod frame_buffer;
mod reader;
mod writer;

pub use frame::{Frame, DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE};
pub use frame_buffer::FrameBuffer;
pub use reader::ValueReader;
pub use writer::ValueWriter;
