//! Error types for wire format parsing and construction.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Wire error code carried in the payload of an error frame.
///
/// The code is a single byte and is total over `u8`: unknown codes decode
/// as-is rather than failing, so an error report from a newer peer is never
/// itself an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    /// The request was malformed (unknown type tag, bad structured payload).
    pub const BAD_REQUEST: Self = Self(0x06);
    /// An unexpected condition not attributable to the request itself.
    pub const UNEXPECTED: Self = Self(0x05);
    /// The connection is being torn down for a protocol violation.
    pub const FATAL: Self = Self(0xff);
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Errors raised while encoding or decoding frames and messages.
///
/// Variants that carry a frame id are message-scoped: the failure is
/// attributable to one request and the connection can keep running.
/// Variants without an id indicate the byte stream itself is broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The declared frame size is below the fixed header length. The
    /// stream framing is unrecoverable after this point.
    #[error("invalid frame length {size}, minimum is the 16 byte header")]
    InvalidFrameLength {
        /// Size field as read off the wire.
        size: u16,
    },

    /// Payload does not fit the 16-bit size field.
    #[error("payload of {len} bytes exceeds the maximum frame size")]
    PayloadTooLarge {
        /// Attempted payload length.
        len: usize,
    },

    /// Frame type tag outside the recognized set.
    #[error("unknown frame type {tag:#04x} for frame {id}")]
    UnknownFrameType {
        /// Raw tag byte.
        tag: u8,
        /// Id of the offending frame.
        id: u32,
    },

    /// A structured payload ended before a declared field.
    #[error("truncated {field} in frame {id}")]
    TruncatedPayload {
        /// Id of the offending frame.
        id: u32,
        /// Field that could not be read.
        field: &'static str,
    },

    /// A string field was not valid UTF-8.
    #[error("invalid utf-8 in {field} of frame {id}")]
    InvalidUtf8 {
        /// Id of the offending frame.
        id: u32,
        /// Field that failed validation.
        field: &'static str,
    },

    /// A handshake header key appeared more than once.
    #[error("duplicate handshake header key {key:?} in frame {id}")]
    DuplicateHeaderKey {
        /// Id of the offending frame.
        id: u32,
        /// The repeated key.
        key: String,
    },

    /// A string field exceeds the 16-bit length prefix on encode.
    #[error("{field} of {len} bytes exceeds the 16-bit length prefix")]
    StringTooLong {
        /// Field being encoded.
        field: &'static str,
        /// Actual byte length.
        len: usize,
    },
}

impl ProtocolError {
    /// Id of the frame this error is attributable to, if any.
    ///
    /// `Some` means the failure is message-scoped; `None` means the byte
    /// stream or an outbound message is broken beyond one request.
    pub fn frame_id(&self) -> Option<u32> {
        match self {
            Self::UnknownFrameType { id, .. }
            | Self::TruncatedPayload { id, .. }
            | Self::InvalidUtf8 { id, .. }
            | Self::DuplicateHeaderKey { id, .. } => Some(*id),
            Self::InvalidFrameLength { .. }
            | Self::PayloadTooLarge { .. }
            | Self::StringTooLong { .. } => None,
        }
    }

    /// Wire error code to report this failure under.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownFrameType { .. }
            | Self::TruncatedPayload { .. }
            | Self::InvalidUtf8 { .. }
            | Self::DuplicateHeaderKey { .. } => ErrorCode::BAD_REQUEST,
            Self::InvalidFrameLength { .. }
            | Self::PayloadTooLarge { .. }
            | Self::StringTooLong { .. } => ErrorCode::FATAL,
        }
    }
}
