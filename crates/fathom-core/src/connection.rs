//! Connection processing chain: handshake gate, heartbeat intercept,
//! error processor.
//!
//! # Architecture: Action-Based State Machine
//!
//! [`Connection`] is pure protocol logic following the action pattern:
//! methods consume inbound bytes or frames and return
//! `Vec<ConnectionAction>` describing intended effects. Driver code
//! executes the actions (write frames, hand messages to the application,
//! close the socket). This keeps the state machine free of I/O and makes
//! every protocol decision directly testable.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  init request, version ok  ┌─────────────┐
//! │ AwaitingInit │───────────────────────────>│ Established │
//! └──────────────┘                            └─────────────┘
//!        │                                           │
//!        │ anything else / version mismatch          │ fatal failure
//!        ↓                                           ↓
//!   ┌────────┐                                  ┌────────┐
//!   │ Closed │                                  │ Closed │
//!   └────────┘                                  └────────┘
//! ```
//!
//! The handshake gate is an explicit state consulted before each message
//! rather than a removable pipeline stage: once `Established`, the gate
//! branch is simply never taken again, so "removal" is one state write and
//! trivially idempotent. After the gate, ping requests are answered in
//! place and everything else is delivered to the application.
//!
//! All components of one connection's chain run strictly sequentially with
//! respect to its inbound byte stream. Connections share nothing but
//! `const` protocol parameters.

use bytes::BytesMut;
use fathom_proto::{ErrorCode, Frame, Message, PROTOCOL_VERSION, codec};

use crate::error::Failure;

/// Actions returned by the connection state machine.
///
/// The driver (test harness or production runtime) executes these:
/// - `SendFrame`: serialize and submit the frame to the transport
/// - `Deliver`: hand the message to the application dispatch layer
/// - `Close`: tear down the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Send this frame to the peer.
    SendFrame(Frame),

    /// Deliver this message to the application layer. Only messages that
    /// survived the handshake gate and were not liveness probes appear
    /// here.
    Deliver(Message),

    /// Close the connection with this reason.
    Close {
        /// Reason for closing the connection.
        reason: String,
    },
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state: no traffic accepted except an init request.
    AwaitingInit,
    /// Handshake complete; frames flow to the application chain.
    Established,
    /// Connection torn down; no further frames are processed.
    Closed,
}

/// Connection configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Send a best-effort error frame before closing on a fatal failure.
    ///
    /// Off by default: a peer that violates the handshake observes a
    /// silent connection closure.
    pub error_frame_on_fatal: bool,
}

/// Id the error frame travels under when a failure has no originating
/// request.
const CONNECTION_SCOPED_ID: u32 = u32::MAX;

/// Per-connection processing chain.
///
/// Owns the handshake state and the failure classification for exactly one
/// connection. This is a pure state machine: no I/O, no clock.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    config: Config,
}

impl Connection {
    /// Create a connection in [`ConnectionState::AwaitingInit`].
    pub fn new(config: Config) -> Self {
        Self { state: ConnectionState::AwaitingInit, config }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Feed inbound bytes through the full chain.
    ///
    /// Decodes as many complete frames as `buf` holds and dispatches each
    /// one; decoding stops on its own once a full frame cannot yet be
    /// assembled, which is the only backpressure this layer applies.
    /// Failures raised anywhere in the chain are routed through the error
    /// processor, so the returned actions already reflect the
    /// classification decision.
    pub fn handle_bytes(&mut self, buf: &mut BytesMut) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();
        while self.state != ConnectionState::Closed {
            match codec::decode(buf) {
                Ok(Some(frame)) => actions.extend(self.handle_frame(frame)),
                Ok(None) => break,
                Err(err) => actions.extend(self.process_failure(err.into())),
            }
        }
        actions
    }

    /// Dispatch one decoded frame through message codec, gate and
    /// intercept, routing failures through the error processor.
    pub fn handle_frame(&mut self, frame: Frame) -> Vec<ConnectionAction> {
        let result = Message::from_frame(frame)
            .map_err(Failure::from)
            .and_then(|message| self.dispatch(message));
        match result {
            Ok(actions) => actions,
            Err(failure) => self.process_failure(failure),
        }
    }

    /// Fold a transport write failure back into the classification path.
    ///
    /// A failed write means the transport is unusable: fatal after the
    /// handshake, and during the handshake it terminates the negotiation.
    pub fn on_write_failure(&mut self, error: &std::io::Error) -> Vec<ConnectionAction> {
        self.process_failure(Failure::fatal(format!("transport write failed: {error}")))
    }

    /// Single entry point for all raised failures.
    ///
    /// Message-scoped failures become one outbound error frame referencing
    /// the originating frame id; the connection keeps running. A reason
    /// that does not itself fit an error frame is replaced with a short
    /// generic report under [`ErrorCode::UNEXPECTED`]. Fatal failures
    /// close the connection, optionally preceded by a best-effort error
    /// frame (see [`Config::error_frame_on_fatal`]).
    pub fn process_failure(&mut self, failure: Failure) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Closed {
            return Vec::new();
        }
        match failure {
            Failure::Message { id, code, reason } => {
                tracing::warn!(id, %reason, "protocol error, reporting to peer");
                let report = Message::Error { id, code, message: reason };
                match report.into_frame() {
                    Ok(frame) => vec![ConnectionAction::SendFrame(frame)],
                    Err(err) => {
                        // The reason does not fit the report; the failure
                        // is still scoped to one frame, so keep the
                        // connection and send a generic report instead.
                        tracing::warn!(id, %err, "error report does not encode");
                        let fallback = Message::Error {
                            id,
                            code: ErrorCode::UNEXPECTED,
                            message: "error report could not be encoded".to_string(),
                        };
                        match fallback.into_frame() {
                            Ok(frame) => vec![ConnectionAction::SendFrame(frame)],
                            Err(err) => self.process_failure(Failure::fatal(format!(
                                "unreportable protocol error: {err}"
                            ))),
                        }
                    },
                }
            },
            Failure::Fatal { ref reason, .. } => {
                tracing::error!(%reason, "fatal protocol error, closing connection");
                self.state = ConnectionState::Closed;
                let mut actions = Vec::new();
                if self.config.error_frame_on_fatal {
                    let report = Message::Error {
                        id: CONNECTION_SCOPED_ID,
                        code: ErrorCode::FATAL,
                        message: reason.clone(),
                    };
                    if let Ok(frame) = report.into_frame() {
                        actions.push(ConnectionAction::SendFrame(frame));
                    }
                }
                actions.push(ConnectionAction::Close { reason: reason.clone() });
                actions
            },
        }
    }

    fn dispatch(&mut self, message: Message) -> Result<Vec<ConnectionAction>, Failure> {
        match self.state {
            ConnectionState::AwaitingInit => self.handle_init(message),
            ConnectionState::Established => self.intercept(message),
            ConnectionState::Closed => Ok(Vec::new()),
        }
    }

    /// Handshake gate: consumes exactly one init request, then transitions
    /// out of the way permanently.
    fn handle_init(&mut self, message: Message) -> Result<Vec<ConnectionAction>, Failure> {
        match message {
            Message::InitRequest { id, version, headers } => {
                if version != PROTOCOL_VERSION {
                    return Err(Failure::fatal(format!(
                        "expected protocol version: {PROTOCOL_VERSION}"
                    )));
                }

                let response = Message::InitResponse { id, version, headers };
                let frame = response
                    .into_frame()
                    .map_err(|err| Failure::fatal(format!("init response encoding: {err}")))?;

                self.state = ConnectionState::Established;
                tracing::debug!(id, "handshake complete");
                Ok(vec![ConnectionAction::SendFrame(frame)])
            },
            _ => Err(Failure::fatal("must not send any data until receiving init request")),
        }
    }

    /// Heartbeat intercept: answer liveness probes in place, pass
    /// everything else to the application.
    fn intercept(&mut self, message: Message) -> Result<Vec<ConnectionAction>, Failure> {
        match message {
            Message::PingRequest { id } => {
                tracing::debug!(id, "answering liveness probe");
                let pong = Message::PingResponse { id }
                    .into_frame()
                    .map_err(|err| Failure::fatal(format!("ping response encoding: {err}")))?;
                Ok(vec![ConnectionAction::SendFrame(pong)])
            },
            other => Ok(vec![ConnectionAction::Deliver(other)]),
        }
    }
}
