//! Error types for tagwire.

use thiserror::Error;

/// Main error type for all codec and dispatch operations.
///
/// Decode-side errors (`TypeMismatch`, `TruncatedFrame`, `Malformed`,
/// `UnknownHeader`) describe a single bad frame; the frame is dropped and
/// logged, the connection stays up. Call-side errors (`TimedOut`,
/// `Cancelled`, `ConnectionClosed`, `ResponseTypeMismatch`) terminate one
/// pending call. Only `DuplicateHeader` is a startup configuration error.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A required field was never written before `finish()`, or a required
    /// field was absent from a received body.
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    /// A field's wire type does not match the kind the schema expects.
    #[error("type mismatch on field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Field number the mismatch occurred on.
        field: u32,
        /// Kind the schema declares.
        expected: &'static str,
        /// Wire type actually present.
        found: &'static str,
    },

    /// A declared length runs past the end of the buffer.
    #[error("truncated frame: need {needed} bytes, {remaining} remaining")]
    TruncatedFrame {
        /// Bytes the current value still requires.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Structurally invalid input (oversized varint, reserved wire type,
    /// invalid UTF-8, bad frame length).
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Frame header is not present in the registry.
    #[error("unknown message header: 0x{0:x}")]
    UnknownHeader(u32),

    /// A response arrived whose type does not match the request's declared
    /// reply type. Protocol violation between peers; fails the call only.
    #[error("response type mismatch: expected header 0x{expected:x}, got 0x{actual:x}")]
    ResponseTypeMismatch {
        /// Header the request declared.
        expected: u32,
        /// Header the peer actually sent.
        actual: u32,
    },

    /// No response within the configured deadline. Does not imply the
    /// request was not processed.
    #[error("call timed out")]
    TimedOut,

    /// The caller cancelled the pending call.
    #[error("call cancelled")]
    Cancelled,

    /// Connection closed while the call was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// Two message types registered the same header. Startup configuration
    /// error; the process cannot proceed with a broken registry.
    #[error("duplicate header registration: 0x{0:x}")]
    DuplicateHeader(u32),

    /// Outbound queue full and the transport did not drain within the
    /// configured wait.
    #[error("outbound queue full")]
    QueueFull,

    /// I/O error from the transport boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error from the catalog export.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ProtoError.
pub type Result<T> = std::result::Result<T, ProtoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_field() {
        let err = ProtoError::MissingRequiredField("group_peer".into());
        assert!(err.to_string().contains("group_peer"));
    }

    #[test]
    fn test_display_headers_in_hex() {
        assert!(ProtoError::UnknownHeader(0xae5).to_string().contains("0xae5"));
        let err = ProtoError::ResponseTypeMismatch {
            expected: 0x66,
            actual: 0xae5,
        };
        let s = err.to_string();
        assert!(s.contains("0x66") && s.contains("0xae5"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: ProtoError = io.into();
        assert!(matches!(err, ProtoError::Io(_)));
    }
}
