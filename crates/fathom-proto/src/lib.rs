//! Wire format for the Fathom RPC protocol.
//!
//! Frames consist of a fixed 16-byte header (zero-copy binary) followed by a
//! variable-length payload. The header carries the total frame size, a
//! one-byte type tag, and a 32-bit id correlating a request with its
//! response. The total size lives in the leading two bytes, so a receiver
//! can tell whether a full frame is buffered by looking at the size prefix
//! alone.
//!
//! ```text
//! | size:2 | type:1 | reserved:1 | id:4 | reserved:8 | payload: size-16 |
//! ```
//!
//! All integers are big-endian. The 16-bit size field bounds a frame at
//! 65535 bytes including the header.
//!
//! # Security
//!
//! Header parsing uses compile-time verified layouts via `zerocopy`. A
//! declared size below the header length is rejected before any payload is
//! touched, and structured payloads (handshake, error) are length-checked
//! field by field. No "fast paths" that skip validation.
#![forbid(unsafe_code)]

pub mod codec;
pub mod errors;
pub mod frame;
pub mod header;
pub mod messages;
pub mod types;

pub use errors::{ErrorCode, ProtocolError, Result};
pub use frame::Frame;
pub use header::{FrameHeader, HEADER_LEN, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{Headers, Message, PROTOCOL_VERSION};
pub use types::FrameType;
