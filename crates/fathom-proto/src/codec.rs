//! Frame codec: raw byte stream to discrete frames and back.
//!
//! Decoding is incremental. The caller accumulates received bytes in a
//! [`BytesMut`] and calls [`decode`] in a loop; `Ok(None)` means "need more
//! bytes" and guarantees the buffer was not consumed, so a retry after more
//! bytes arrive re-reads from the same offset. Encoding never copies the
//! payload: the serialized header and the payload are chained into one
//! logical buffer for the transport.

use bytes::buf::Chain;
use bytes::{Buf as _, BufMut as _, Bytes, BytesMut};
use zerocopy::{FromBytes as _, IntoBytes as _};

use crate::errors::{ProtocolError, Result};
use crate::frame::Frame;
use crate::header::{FrameHeader, HEADER_LEN};

/// Width of the leading size prefix.
const FRAME_SIZE_LEN: usize = 2;

/// Encode a frame into one logical buffer.
///
/// The header is serialized into its own small allocation; the payload is
/// chained behind it without copying. Both pieces are owned values, so any
/// caller that drops the result (for example after a failed write) releases
/// them exactly once.
pub fn encode(frame: &Frame) -> Chain<Bytes, Bytes> {
    let header = FrameHeader::new(frame.size(), frame.tag(), frame.id());
    let header_buf = Bytes::copy_from_slice(header.as_bytes());
    header_buf.chain(frame.payload().clone())
}

/// Encode a frame into a contiguous byte vector.
///
/// Convenience for tests and callers that need a single slice; production
/// writes should prefer [`encode`] and vectored I/O.
pub fn encode_to_vec(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.size() as usize);
    out.put(encode(frame));
    out
}

/// Decode zero or one frame from the front of `src`.
///
/// Returns `Ok(None)` when fewer bytes than a full frame are buffered; in
/// that case `src` is left untouched. On success, exactly `size` bytes are
/// consumed and the returned frame's payload aliases the consumed region.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFrameLength`] if the size prefix is
/// below the fixed header length. The framing is unrecoverable after this:
/// the caller must tear the connection down.
pub fn decode(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < FRAME_SIZE_LEN {
        return Ok(None);
    }

    // Peek the size prefix without consuming it.
    let size = usize::from(u16::from_be_bytes([src[0], src[1]]));
    if size < HEADER_LEN {
        return Err(ProtocolError::InvalidFrameLength { size: size as u16 });
    }
    if src.len() < size {
        return Ok(None);
    }

    let frame_bytes = src.split_to(size).freeze();
    let header = FrameHeader::read_from_bytes(&frame_bytes[..HEADER_LEN])
        .map_err(|_| ProtocolError::InvalidFrameLength { size: size as u16 })?;
    let payload = frame_bytes.slice(HEADER_LEN..);

    Ok(Some(Frame::from_wire(header.frame_type(), header.id(), payload)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::BufMut as _;

    use super::*;
    use crate::types::FrameType;

    fn call_frame(id: u32, payload: &'static [u8]) -> Frame {
        Frame::new(FrameType::CallRequest, id, Bytes::from_static(payload)).unwrap()
    }

    #[test]
    fn encode_decode_round_trip() {
        let frame = call_frame(u32::MAX, b"Hello, World!");
        let mut buf = BytesMut::from(encode_to_vec(&frame).as_slice());

        let decoded = decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.size(), frame.size());
        assert_eq!(decoded.tag(), frame.tag());
        assert_eq!(decoded.id(), frame.id());
        assert_eq!(decoded.payload(), frame.payload());
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_needs_more_bytes() {
        let frame = call_frame(25, b"hello");
        let encoded = encode_to_vec(&frame);

        // Every strict prefix must yield None and leave the buffer alone.
        for cut in 0..encoded.len() {
            let mut buf = BytesMut::from(&encoded[..cut]);
            let before = buf.len();
            assert!(decode(&mut buf).unwrap().is_none(), "prefix of {cut} bytes");
            assert_eq!(buf.len(), before, "prefix of {cut} bytes consumed data");
        }
    }

    #[test]
    fn decode_consumes_exactly_one_frame() {
        let first = call_frame(1, b"first");
        let second = call_frame(2, b"second");

        let mut buf = BytesMut::new();
        buf.put_slice(&encode_to_vec(&first));
        buf.put_slice(&encode_to_vec(&second));

        let decoded = decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.id(), 1);
        assert_eq!(buf.len(), second.size() as usize);

        let decoded = decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.id(), 2);
        assert!(buf.is_empty());
    }

    #[test]
    fn decoded_payload_aliases_source_buffer() {
        let frame = call_frame(7, b"zero copy");
        let mut buf = BytesMut::from(encode_to_vec(&frame).as_slice());
        let base = buf.as_ref().as_ptr() as usize;

        let decoded = decode(&mut buf).unwrap().unwrap();
        let payload_ptr = decoded.payload().as_ref().as_ptr() as usize;
        assert_eq!(payload_ptr, base + HEADER_LEN, "payload was copied");
    }

    #[test]
    fn undersized_length_prefix_is_a_framing_error() {
        // Declared size 4 is below the 16 byte header.
        let mut buf = BytesMut::from(&[0x00, 0x04, 0x01, 0x00][..]);
        let before = buf.len();
        let result = decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::InvalidFrameLength { size: 4 })));
        // A failed decode must not retain or consume anything.
        assert_eq!(buf.len(), before);
    }

    #[test]
    fn encode_chains_payload_without_copy() {
        let frame = call_frame(3, b"payload bytes");
        let payload_ptr = frame.payload().as_ref().as_ptr();

        let chain = encode(&frame);
        let (_, chained_payload) = chain.into_inner();
        assert_eq!(chained_payload.as_ref().as_ptr(), payload_ptr);
    }

    #[test]
    fn header_only_frame_round_trips() {
        let frame = Frame::new(FrameType::PingRequest, 9, Bytes::new()).unwrap();
        let mut buf = BytesMut::from(encode_to_vec(&frame).as_slice());

        let decoded = decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.frame_type(), Some(FrameType::PingRequest));
        assert!(decoded.payload().is_empty());
    }
}
