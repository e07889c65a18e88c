//! Fathom connection-level protocol core.
//!
//! Pure state machine logic for a single connection's inbound processing
//! chain, completely decoupled from I/O. Bytes go in, typed messages and
//! declarative actions come out:
//!
//! ```text
//! bytes -> frame codec -> message codec -> handshake gate -> ping intercept -> application
//! ```
//!
//! # Architecture
//!
//! The [`connection::Connection`] state machine owns the per-connection
//! handshake state and returns `Vec<ConnectionAction>` describing intended
//! effects (send a frame, deliver a message to the application, close the
//! connection). A runtime or test harness interprets and executes those
//! actions; the state machine itself never touches a socket or a clock.
//!
//! This separation keeps protocol correctness independent of execution
//! concerns: the same dispatch code runs under a production runtime and
//! under deterministic unit tests, and every failure raised anywhere in
//! the chain is routed through one classification point that decides
//! between reporting to the peer and tearing the connection down.
//!
//! # Components
//!
//! - [`connection`]: handshake gate, heartbeat intercept, error processor
//! - [`error`]: the two-class failure taxonomy (message- vs connection-scoped)
//! - [`transport`]: async framed read/write over `AsyncRead`/`AsyncWrite`

pub mod connection;
pub mod error;
pub mod transport;

pub use connection::{Config, Connection, ConnectionAction, ConnectionState};
pub use error::{Failure, Trace};
