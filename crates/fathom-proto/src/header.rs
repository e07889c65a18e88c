//! Fixed 16-byte frame header.
//!
//! The header layout is compile-time verified via `zerocopy`, so parsing a
//! header is a checked reinterpretation of 16 bytes rather than a
//! field-by-field reader.

use zerocopy::byteorder::big_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Length of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 16;

/// Maximum total frame size, bounded by the 16-bit size field.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Maximum payload length a single frame can carry.
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - HEADER_LEN;

/// Wire representation of the frame header.
///
/// ```text
/// | size:2 | type:1 | reserved:1 | id:4 | reserved:8 |
/// ```
///
/// `size` is the total frame length including this header. Reserved bytes
/// are written as zero and ignored on read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct FrameHeader {
    size: U16,
    frame_type: u8,
    reserved: u8,
    id: U32,
    reserved2: [u8; 8],
}

// The wire contract depends on this exact size.
const _: () = assert!(size_of::<FrameHeader>() == HEADER_LEN);

impl FrameHeader {
    /// Build a header for a frame of `size` total bytes.
    pub fn new(size: u16, frame_type: u8, id: u32) -> Self {
        Self {
            size: U16::new(size),
            frame_type,
            reserved: 0,
            id: U32::new(id),
            reserved2: [0; 8],
        }
    }

    /// Total frame size including the header.
    pub fn size(&self) -> u16 {
        self.size.get()
    }

    /// Raw one-byte type tag.
    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    /// Frame id correlating a request with its response.
    pub fn id(&self) -> u32 {
        self.id.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use zerocopy::IntoBytes as _;

    use super::*;

    #[test]
    fn header_round_trips_through_bytes() {
        let header = FrameHeader::new(21, 0x01, 0xdead_beef);
        let bytes = header.as_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);

        let parsed = FrameHeader::read_from_bytes(bytes).unwrap();
        assert_eq!(parsed.size(), 21);
        assert_eq!(parsed.frame_type(), 0x01);
        assert_eq!(parsed.id(), 0xdead_beef);
    }

    #[test]
    fn header_layout_is_big_endian() {
        let header = FrameHeader::new(0x0102, 0xd0, 0x0a0b_0c0d);
        let bytes = header.as_bytes();
        assert_eq!(&bytes[0..2], &[0x01, 0x02]);
        assert_eq!(bytes[2], 0xd0);
        assert_eq!(bytes[3], 0x00);
        assert_eq!(&bytes[4..8], &[0x0a, 0x0b, 0x0c, 0x0d]);
        assert_eq!(&bytes[8..16], &[0; 8]);
    }
}
