//! Frame type tags.

/// One-byte tag selecting the message kind a frame carries.
///
/// The set is closed: decoding maps raw bytes through [`FrameType::from_u8`]
/// and any tag outside this set is a message-scoped protocol error, never a
/// panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Handshake request, the first frame on every connection.
    InitRequest = 0x01,
    /// Handshake response echoing the request id and headers.
    InitResponse = 0x02,
    /// Application call request (payload opaque to this layer).
    CallRequest = 0x03,
    /// Application call response (payload opaque to this layer).
    CallResponse = 0x04,
    /// Liveness probe request, answered below the application layer.
    PingRequest = 0xd0,
    /// Liveness probe response.
    PingResponse = 0xd1,
    /// Error report, message- or connection-scoped.
    Error = 0xff,
}

impl FrameType {
    /// Decode from a raw tag byte. Returns `None` for unknown tags.
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::InitRequest),
            0x02 => Some(Self::InitResponse),
            0x03 => Some(Self::CallRequest),
            0x04 => Some(Self::CallResponse),
            0xd0 => Some(Self::PingRequest),
            0xd1 => Some(Self::PingResponse),
            0xff => Some(Self::Error),
            _ => None,
        }
    }

    /// Encode to the raw tag byte.
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::InitRequest => "init request",
            Self::InitResponse => "init response",
            Self::CallRequest => "call request",
            Self::CallResponse => "call response",
            Self::PingRequest => "ping request",
            Self::PingResponse => "ping response",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[FrameType] = &[
        FrameType::InitRequest,
        FrameType::InitResponse,
        FrameType::CallRequest,
        FrameType::CallResponse,
        FrameType::PingRequest,
        FrameType::PingResponse,
        FrameType::Error,
    ];

    #[test]
    fn tag_round_trip() {
        for ty in ALL {
            assert_eq!(FrameType::from_u8(ty.to_u8()), Some(*ty));
        }
    }

    #[test]
    fn unknown_tags_decode_to_none() {
        assert_eq!(FrameType::from_u8(0x00), None);
        assert_eq!(FrameType::from_u8(0x05), None);
        assert_eq!(FrameType::from_u8(0xd2), None);
        assert_eq!(FrameType::from_u8(0xfe), None);
    }
}
