//! Client library for the remo remote-operations protocol.
//!
//! A [`Session`] owns one logical binding to a remote agent and exposes
//! the protocol's operations — liveness check, command execution, file
//! transfer, directory listing, remote shutdown — as blocking calls.
//!
//! # Quick start
//!
//! ```no_run
//! use remo::Session;
//!
//! fn main() -> remo::Result<()> {
//!     let mut session = Session::new();
//!     session.connect("127.0.0.1", remo::DEFAULT_PORT)?;
//!
//!     let out = session.exec("uname -a")?;
//!     println!("exit {}: {}", out.code, out.output);
//!
//!     session.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! A session is not designed for overlapping calls; callers needing
//! parallelism open independent sessions, each with its own binding.

mod binding;
mod error;
mod session;

pub use error::{Error, Fault, Result};
pub use remo_proto::{DEFAULT_PORT, MAX_TRANSFER_BYTES, OpError, PONG, Payload};
pub use session::{ExecOutput, Session, SessionState};
