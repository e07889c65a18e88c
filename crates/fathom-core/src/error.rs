//! Failure taxonomy for the connection pipeline.
//!
//! Every failure raised inside the processing chain is one of two kinds:
//! message-scoped (attributable to a single frame, reported to the peer,
//! connection keeps running) or connection-fatal (the connection must be
//! torn down). The [`connection`](crate::connection) module owns the sole
//! authority to act on this classification; everything else only raises.
//!
//! Failures that are neither - I/O errors from the transport seam -
//! propagate to the surrounding runtime unchanged rather than being
//! classified here.

use fathom_proto::{ErrorCode, ProtocolError};
use thiserror::Error;

/// Opaque trace token threaded through fatal error construction.
///
/// This core never generates or interprets trace ids; it only carries the
/// token so the layer above can correlate a teardown with its tracing
/// spans. The all-zero token marks failures with no originating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trace {
    /// Span id of the operation that raised the failure.
    pub span_id: u64,
    /// Parent span id.
    pub parent_id: u64,
    /// Trace id shared across the request tree.
    pub trace_id: u64,
    /// Sampling flags.
    pub flags: u8,
}

/// A raised protocol failure, classified by scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// Attributable to one frame: reported to the peer via an error frame,
    /// the connection stays open.
    #[error("protocol error on frame {id}: {reason}")]
    Message {
        /// Id of the frame that triggered the failure.
        id: u32,
        /// Wire error code to report under.
        code: ErrorCode,
        /// Human-readable reason, sent to the peer.
        reason: String,
    },

    /// The connection is unusable: torn down, no response guaranteed.
    #[error("fatal protocol error: {reason}")]
    Fatal {
        /// Opaque trace token for the layer above.
        trace: Trace,
        /// Human-readable reason.
        reason: String,
    },
}

impl Failure {
    /// Whether this failure requires the connection to be torn down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Fatal failure with no originating request.
    pub(crate) fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal { trace: Trace::default(), reason: reason.into() }
    }
}

impl From<ProtocolError> for Failure {
    /// Classify a wire-format error: errors attributable to one frame
    /// become message-scoped, framing violations become fatal.
    fn from(err: ProtocolError) -> Self {
        match err.frame_id() {
            Some(id) => Self::Message { id, code: err.code(), reason: err.to_string() },
            None => Self::fatal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_frame_type_is_message_scoped() {
        let failure = Failure::from(ProtocolError::UnknownFrameType { tag: 0xab, id: 12 });
        assert!(!failure.is_fatal());
        assert!(matches!(
            failure,
            Failure::Message { id: 12, code: ErrorCode::BAD_REQUEST, .. }
        ));
    }

    #[test]
    fn framing_violation_is_fatal() {
        let failure = Failure::from(ProtocolError::InvalidFrameLength { size: 3 });
        assert!(failure.is_fatal());
    }

    #[test]
    fn invalid_utf8_is_message_scoped() {
        let failure = Failure::from(ProtocolError::InvalidUtf8 { id: 21, field: "header key" });
        assert!(!failure.is_fatal());
        assert!(matches!(
            failure,
            Failure::Message { id: 21, code: ErrorCode::BAD_REQUEST, .. }
        ));
    }

    #[test]
    fn truncated_payload_is_message_scoped() {
        let failure = Failure::from(ProtocolError::TruncatedPayload { id: 4, field: "version" });
        assert!(matches!(failure, Failure::Message { id: 4, .. }));
    }
}
