//! Wire protocol for remo client↔agent communication.
//!
//! Messages are serialized with [`postcard`] and framed with an 8-byte
//! big-endian length prefix, suitable for any reliable byte stream. The
//! frame width is sized so a single call can carry a file transfer up to
//! [`MAX_TRANSFER_BYTES`].

mod codec;
mod message;

pub use codec::{decode, encode};
pub use message::{DEFAULT_PORT, MAX_TRANSFER_BYTES, OpError, PONG, Payload, Request, Response};
