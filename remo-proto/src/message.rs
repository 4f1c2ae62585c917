//! Protocol message types for client↔agent communication.

use serde::{Deserialize, Serialize};

/// Default TCP port for the remo agent.
pub const DEFAULT_PORT: u16 = 12345;

/// Sentinel returned by a healthy agent's liveness call.
///
/// A peer that is reachable but answers anything else is not speaking
/// this protocol and must be treated as a failed connection.
pub const PONG: &str = "PONG_OK";

/// Upper bound on a single file transfer, in either direction (10 GiB).
///
/// Valid transfer sizes are `1..MAX_TRANSFER_BYTES`; zero bytes is an
/// invalid parameter and anything at or above the cap is too large.
pub const MAX_TRANSFER_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Request sent from client to agent.
#[derive(Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Request {
    /// Liveness check; the agent answers with [`PONG`].
    Ping,
    /// Execute a command with output captured.
    Exec {
        /// Command line, interpreted by the agent's platform shell.
        command: String,
    },
    /// Execute a command without capturing output; the child inherits
    /// the agent's own output streams.
    ExecSilent {
        /// Command line, interpreted by the agent's platform shell.
        command: String,
    },
    /// Write a byte buffer to a file on the agent.
    Upload {
        /// Destination path on the agent (created or truncated).
        path: String,
        /// File content; never empty.
        data: Payload,
    },
    /// Read a whole file from the agent.
    Download {
        /// Source path on the agent.
        path: String,
    },
    /// List a directory on the agent.
    List {
        /// Directory path; `None` means the agent's current directory.
        path: Option<String>,
    },
    /// Stop the agent. Fire-and-forget: no response frame follows.
    Shutdown,
}

/// Response sent from agent to client.
#[derive(Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Response {
    /// Reply to [`Request::Ping`], carrying the liveness sentinel.
    Pong(String),
    /// Reply to [`Request::Exec`].
    Exec {
        /// Remote process exit code (`-1` if killed by a signal).
        code: i32,
        /// Captured combined stdout and stderr, decoded to text.
        output: String,
    },
    /// Reply to [`Request::ExecSilent`]: the exit code alone.
    Exit(i32),
    /// Reply to a successful [`Request::Upload`].
    Uploaded,
    /// Reply to a successful [`Request::Download`]; ownership of the
    /// buffer transfers to the receiver.
    File(Payload),
    /// Reply to a successful [`Request::List`]: the rendered listing.
    Listing(String),
    /// The call completed but the operation failed.
    Error(OpError),
}

/// Byte buffer whose ownership transfers across the call boundary.
///
/// The producing side allocates it; after the call returns, the receiving
/// side is its sole owner and releases it exactly once, either by dropping
/// it or by consuming it with [`Payload::into_bytes`]. Move semantics rule
/// out a second release or two simultaneous owners. On the wire the buffer
/// carries an explicit length alongside the data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Releases the buffer to the caller, consuming the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// In-band failure status carried inside a completed response.
///
/// Distinct from a transport fault: an `OpError` means the call reached
/// the agent and came back, but the operation itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[non_exhaustive]
pub enum OpError {
    /// A required argument was missing, empty, or zero-sized.
    #[error("invalid parameter")]
    InvalidParameter,

    /// A transfer was at or above [`MAX_TRANSFER_BYTES`].
    #[error("file too large (transfers are capped at 10 GiB)")]
    FileTooLarge,

    /// The transfer buffer could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// An operating-system error, surfaced verbatim.
    #[error("{message}")]
    Io {
        /// Raw OS error code, when one was available.
        code: Option<i32>,
        /// The OS error message.
        message: String,
    },
}

impl OpError {
    /// Captures an I/O error verbatim, keeping the raw OS code.
    pub fn from_io(err: &std::io::Error) -> Self {
        Self::Io {
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}
