//! Async framed I/O over a byte-stream transport.
//!
//! The only I/O-aware module in this crate. It connects the frame codec to
//! `AsyncRead`/`AsyncWrite` streams without committing to a particular
//! transport: production can hand in a TCP or TLS stream, tests an
//! in-memory duplex pipe.
//!
//! Writes are independent of inbound processing; a driver that submits a
//! write and observes a failure is expected to fold it back into the
//! connection via [`Connection::on_write_failure`](crate::Connection::on_write_failure).

use std::io;

use bytes::BytesMut;
use fathom_proto::{Frame, codec};
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};

/// Read one frame, pulling more bytes into `buf` as needed.
///
/// `buf` is the connection's receive accumulator and carries partial-frame
/// state between calls; the caller must reuse the same buffer for the
/// lifetime of the connection.
///
/// Returns `Ok(None)` on a clean end of stream (EOF on a frame boundary).
///
/// # Errors
///
/// EOF in the middle of a frame is [`io::ErrorKind::UnexpectedEof`]. A
/// framing violation (size prefix below the header length) surfaces as
/// [`io::ErrorKind::InvalidData`]; the stream is unusable afterwards.
pub async fn read_frame<R>(io: &mut R, buf: &mut BytesMut) -> io::Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Some(frame) =
            codec::decode(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?
        {
            return Ok(Some(frame));
        }

        if io.read_buf(buf).await? == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-frame",
            ));
        }
    }
}

/// Write one frame.
///
/// The encoded header and the payload are submitted as one logical buffer
/// (vectored write, no payload copy) and flushed.
pub async fn write_frame<W>(io: &mut W, frame: &Frame) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = codec::encode(frame);
    io.write_all_buf(&mut encoded).await?;
    io.flush().await
}
