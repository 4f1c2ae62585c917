//! Error types for remo client operations.

use std::io;

use remo_proto::OpError;

/// Alias for `Result<T, remo::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failure raised instead of a response.
///
/// A fault aborts a call before or without a dispatcher response. An
/// [`OpError`] by contrast travels inside a completed response; the two
/// channels never mix.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Fault {
    /// The peer is gone or was never reachable.
    #[error("server unavailable: {0}")]
    Unavailable(io::Error),

    /// The peer did not service the call in time.
    #[error("server too busy: {0}")]
    Busy(io::Error),

    /// Any other transport failure, including malformed frames.
    #[error("transport error: {0}")]
    Transport(io::Error),
}

impl Fault {
    /// Classifies an I/O error into a fault category.
    pub(crate) fn classify(err: io::Error) -> Self {
        use io::ErrorKind::{
            BrokenPipe, ConnectionAborted, ConnectionRefused, ConnectionReset, HostUnreachable,
            NetworkUnreachable, NotConnected, TimedOut, UnexpectedEof, WouldBlock,
        };
        match err.kind() {
            ConnectionRefused | ConnectionReset | ConnectionAborted | BrokenPipe
            | HostUnreachable | NetworkUnreachable | NotConnected | UnexpectedEof => {
                Self::Unavailable(err)
            }
            TimedOut | WouldBlock => Self::Busy(err),
            _ => Self::Transport(err),
        }
    }

    /// `true` when the fault implies the peer is dead for this binding.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Busy(_))
    }
}

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The session holds no binding; the transport was never touched.
    #[error("session is not connected")]
    NotConnected,

    /// The transport raised a fault during the call.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The call completed and the agent reported a failure status.
    #[error(transparent)]
    Op(#[from] OpError),

    /// The peer is reachable but did not present the liveness sentinel.
    #[error("handshake failed: expected {expected:?}, got {got:?}")]
    Handshake {
        /// The sentinel a healthy agent returns.
        expected: &'static str,
        /// What the peer actually sent.
        got: String,
    },

    /// The agent answered with a response shape the call did not ask for.
    #[error("unexpected response to {operation}")]
    UnexpectedResponse {
        /// The operation that was invoked.
        operation: &'static str,
    },
}
