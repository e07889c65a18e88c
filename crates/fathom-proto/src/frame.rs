//! The frame value: a length-delimited binary envelope.

use bytes::Bytes;

use crate::errors::{ProtocolError, Result};
use crate::header::{HEADER_LEN, MAX_PAYLOAD_SIZE};
use crate::types::FrameType;

/// A single protocol frame: fixed header plus an opaque payload.
///
/// The `size == HEADER_LEN + payload.len()` invariant is enforced at
/// construction, so every `Frame` in existence describes a valid wire
/// frame. The payload is a [`Bytes`] handle: frames decoded off the wire
/// alias the receive buffer rather than copying it, and the slice is
/// released when the frame (and any clones of the handle) are dropped.
///
/// The type tag is kept raw here. Mapping it onto the closed
/// [`FrameType`] set is the message layer's job, so an unknown tag can be
/// reported with its frame id instead of being rejected below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    tag: u8,
    id: u32,
    payload: Bytes,
}

impl Frame {
    /// Build a frame with a recognized type tag.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if the payload does not
    /// fit the 16-bit size field.
    pub fn new(frame_type: FrameType, id: u32, payload: Bytes) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge { len: payload.len() });
        }
        Ok(Self { tag: frame_type.to_u8(), id, payload })
    }

    /// Build a frame from wire-decoded parts. The codec has already
    /// bounded the payload via the 16-bit size field.
    pub(crate) fn from_wire(tag: u8, id: u32, payload: Bytes) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD_SIZE);
        Self { tag, id, payload }
    }

    /// Total encoded size in bytes, header included.
    pub fn size(&self) -> u16 {
        (HEADER_LEN + self.payload.len()) as u16
    }

    /// Raw one-byte type tag.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Type tag mapped onto the closed set, `None` if unrecognized.
    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u8(self.tag)
    }

    /// Frame id correlating a request with its response.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the frame, yielding ownership of the payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}
