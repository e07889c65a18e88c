//! Typed messages and their payload codecs.
//!
//! A [`Message`] is the typed decoding of a frame's payload, selected by the
//! frame's type tag. The mapping is total over the closed tag set; an
//! unknown tag surfaces a message-scoped [`ProtocolError`] carrying the
//! offending frame's id rather than silently dropping the frame.
//!
//! Structured payload layouts (big-endian, lengths in bytes):
//!
//! ```text
//! init request/response:  version:2 nh:2 (key~2 value~2){nh}
//! ping request/response:  (empty)
//! error:                  code:1 message~2
//! ```
//!
//! `x~2` denotes a u16 length prefix followed by that many bytes of UTF-8.
//! Call request/response payloads are opaque to this layer and are carried
//! through as raw bytes.

use std::collections::BTreeMap;

use bytes::{Buf as _, BufMut as _, Bytes, BytesMut};

use crate::errors::{ErrorCode, ProtocolError, Result};
use crate::frame::Frame;
use crate::types::FrameType;

/// The single protocol version this implementation speaks.
///
/// Immutable process-wide configuration; a handshake naming any other
/// version is a fatal mismatch.
pub const PROTOCOL_VERSION: u16 = 2;

/// Handshake headers: unique UTF-8 keys, order irrelevant.
pub type Headers = BTreeMap<String, String>;

/// Typed decoding of a frame, closed over the protocol's message kinds.
///
/// Every variant carries the originating frame's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Handshake request: protocol version plus peer headers.
    InitRequest {
        /// Originating frame id.
        id: u32,
        /// Protocol version the peer wants to speak.
        version: u16,
        /// Peer-supplied handshake headers.
        headers: Headers,
    },
    /// Handshake response echoing the request's id and headers.
    InitResponse {
        /// Echoed frame id.
        id: u32,
        /// Negotiated protocol version.
        version: u16,
        /// Echoed handshake headers.
        headers: Headers,
    },
    /// Liveness probe; correlation is by frame id only.
    PingRequest {
        /// Originating frame id.
        id: u32,
    },
    /// Liveness probe answer.
    PingResponse {
        /// Echoed frame id.
        id: u32,
    },
    /// Application call request; body is opaque to this core.
    CallRequest {
        /// Originating frame id.
        id: u32,
        /// Opaque application payload.
        body: Bytes,
    },
    /// Application call response; body is opaque to this core.
    CallResponse {
        /// Echoed frame id.
        id: u32,
        /// Opaque application payload.
        body: Bytes,
    },
    /// Error report from the peer or to the peer.
    Error {
        /// Id of the frame the error refers to, `u32::MAX` when the
        /// failure is connection-scoped.
        id: u32,
        /// Wire error code.
        code: ErrorCode,
        /// Human-readable reason.
        message: String,
    },
}

impl Message {
    /// Frame id this message travels under.
    pub fn id(&self) -> u32 {
        match self {
            Self::InitRequest { id, .. }
            | Self::InitResponse { id, .. }
            | Self::PingRequest { id }
            | Self::PingResponse { id }
            | Self::CallRequest { id, .. }
            | Self::CallResponse { id, .. }
            | Self::Error { id, .. } => *id,
        }
    }

    /// Frame type tag this message encodes to.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::InitRequest { .. } => FrameType::InitRequest,
            Self::InitResponse { .. } => FrameType::InitResponse,
            Self::PingRequest { .. } => FrameType::PingRequest,
            Self::PingResponse { .. } => FrameType::PingResponse,
            Self::CallRequest { .. } => FrameType::CallRequest,
            Self::CallResponse { .. } => FrameType::CallResponse,
            Self::Error { .. } => FrameType::Error,
        }
    }

    /// Decode a frame's payload into a typed message.
    ///
    /// The frame's payload is reinterpreted in place; opaque call bodies
    /// keep aliasing the receive buffer.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnknownFrameType`] for a tag outside the closed
    /// set, or a message-scoped decode error for a malformed structured
    /// payload. All carry the offending frame's id.
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let id = frame.id();
        let Some(frame_type) = frame.frame_type() else {
            return Err(ProtocolError::UnknownFrameType { tag: frame.tag(), id });
        };

        match frame_type {
            FrameType::InitRequest => {
                let (version, headers) = decode_init(id, frame.into_payload())?;
                Ok(Self::InitRequest { id, version, headers })
            },
            FrameType::InitResponse => {
                let (version, headers) = decode_init(id, frame.into_payload())?;
                Ok(Self::InitResponse { id, version, headers })
            },
            // A non-empty ping payload is tolerated and ignored;
            // correlation is by frame id only.
            FrameType::PingRequest => Ok(Self::PingRequest { id }),
            FrameType::PingResponse => Ok(Self::PingResponse { id }),
            FrameType::CallRequest => Ok(Self::CallRequest { id, body: frame.into_payload() }),
            FrameType::CallResponse => Ok(Self::CallResponse { id, body: frame.into_payload() }),
            FrameType::Error => {
                let (code, message) = decode_error(id, frame.into_payload())?;
                Ok(Self::Error { id, code, message })
            },
        }
    }

    /// Encode this message into a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if a string field exceeds its 16-bit length prefix
    /// or the assembled payload does not fit one frame.
    pub fn into_frame(self) -> Result<Frame> {
        let frame_type = self.frame_type();
        let id = self.id();
        let payload = match self {
            Self::InitRequest { version, headers, .. }
            | Self::InitResponse { version, headers, .. } => encode_init(version, &headers)?,
            Self::PingRequest { .. } | Self::PingResponse { .. } => Bytes::new(),
            Self::CallRequest { body, .. } | Self::CallResponse { body, .. } => body,
            Self::Error { code, message, .. } => encode_error(code, &message)?,
        };
        Frame::new(frame_type, id, payload)
    }
}

fn read_u16(buf: &mut Bytes, id: u32, field: &'static str) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(ProtocolError::TruncatedPayload { id, field });
    }
    Ok(buf.get_u16())
}

fn read_string(buf: &mut Bytes, id: u32, field: &'static str) -> Result<String> {
    let len = usize::from(read_u16(buf, id, field)?);
    if buf.remaining() < len {
        return Err(ProtocolError::TruncatedPayload { id, field });
    }
    let raw = buf.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8 { id, field })
}

fn decode_init(id: u32, mut payload: Bytes) -> Result<(u16, Headers)> {
    let version = read_u16(&mut payload, id, "version")?;
    let count = read_u16(&mut payload, id, "header count")?;

    let mut headers = Headers::new();
    for _ in 0..count {
        let key = read_string(&mut payload, id, "header key")?;
        let value = read_string(&mut payload, id, "header value")?;
        if headers.insert(key.clone(), value).is_some() {
            return Err(ProtocolError::DuplicateHeaderKey { id, key });
        }
    }
    Ok((version, headers))
}

fn put_string(buf: &mut BytesMut, field: &'static str, value: &str) -> Result<()> {
    let len = value.len();
    let Ok(len) = u16::try_from(len) else {
        return Err(ProtocolError::StringTooLong { field, len });
    };
    buf.put_u16(len);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn encode_init(version: u16, headers: &Headers) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    buf.put_u16(version);
    let count = headers.len();
    let Ok(count) = u16::try_from(count) else {
        return Err(ProtocolError::StringTooLong { field: "header count", len: count });
    };
    buf.put_u16(count);
    for (key, value) in headers {
        put_string(&mut buf, "header key", key)?;
        put_string(&mut buf, "header value", value)?;
    }
    Ok(buf.freeze())
}

fn decode_error(id: u32, mut payload: Bytes) -> Result<(ErrorCode, String)> {
    if payload.remaining() < 1 {
        return Err(ProtocolError::TruncatedPayload { id, field: "error code" });
    }
    let code = ErrorCode(payload.get_u8());
    let message = read_string(&mut payload, id, "error message")?;
    Ok((code, message))
}

fn encode_error(code: ErrorCode, message: &str) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    buf.put_u8(code.0);
    put_string(&mut buf, "error message", message)?;
    Ok(buf.freeze())
}
