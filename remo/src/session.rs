//! Client session state machine.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use remo_proto::{MAX_TRANSFER_BYTES, OpError, PONG, Payload, Request, Response};
use tracing::debug;

use crate::binding::Binding;
use crate::error::{Error, Result};

/// Connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionState {
    /// No binding is held.
    Disconnected,
    /// A binding is held and has passed the liveness handshake.
    Connected,
}

/// Remembered server address for reconnects.
#[derive(Debug, Clone)]
struct Endpoint {
    /// Agent host name or address.
    host: String,
    /// Agent TCP port.
    port: u16,
}

/// Output of a captured remote command execution.
#[derive(Debug)]
pub struct ExecOutput {
    /// Remote process exit code (`-1` if killed by a signal).
    pub code: i32,
    /// Combined captured output, decoded to text by the agent.
    pub output: String,
}

/// A client session owning one logical binding to a remote agent.
///
/// Calls block until the agent responds or the transport faults; faults
/// come back as [`Error`] values, never as panics. Two operations have
/// session-wide side effects: a [`ping`](Session::ping) whose fault says
/// the peer is gone drops the binding, and [`shutdown`](Session::shutdown)
/// always leaves the session disconnected. Everything else leaves the
/// connection state untouched.
#[derive(Debug, Default)]
pub struct Session {
    /// Last-used server address, recorded on every connect attempt.
    endpoint: Option<Endpoint>,
    /// The live binding; `Some` exactly when connected.
    binding: Option<Binding>,
}

impl Session {
    /// Creates a disconnected session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        if self.binding.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// `true` when a validated binding is held.
    pub fn is_connected(&self) -> bool {
        self.binding.is_some()
    }

    /// Connects to `host:port` and validates the peer with a liveness call.
    ///
    /// An existing connection is torn down first, and the address is
    /// recorded for [`reconnect`](Session::reconnect). The connect only
    /// counts once the agent returns the exact liveness sentinel: a peer
    /// that is reachable but answers anything else leaves the session
    /// disconnected with the binding released, the same as an unreachable
    /// one.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.disconnect();
        self.endpoint = Some(Endpoint {
            host: host.to_owned(),
            port,
        });

        // The binding local is dropped on every error path below, so a
        // failed handshake never leaks the transport resource.
        let mut binding = Binding::open((host, port))?;
        match binding.call(&Request::Ping) {
            Ok(Response::Pong(banner)) if banner == PONG => {
                debug!(host, port, "connected");
                self.binding = Some(binding);
                Ok(())
            }
            Ok(Response::Pong(banner)) => Err(Error::Handshake {
                expected: PONG,
                got: banner,
            }),
            Ok(Response::Error(e)) => Err(Error::Op(e)),
            Ok(_) => Err(Error::UnexpectedResponse { operation: "ping" }),
            Err(fault) => Err(Error::Fault(fault)),
        }
    }

    /// Releases the binding if one is held.
    ///
    /// Safe to call any number of times and from scoped-cleanup paths;
    /// a disconnected session stays disconnected.
    pub fn disconnect(&mut self) {
        if self.binding.take().is_some() {
            debug!("disconnected");
        }
    }

    /// Disconnects and connects again using the last-used host and port.
    ///
    /// Fails with [`Error::NotConnected`] when no prior connect recorded
    /// an address.
    pub fn reconnect(&mut self) -> Result<()> {
        let Endpoint { host, port } = self.endpoint.clone().ok_or(Error::NotConnected)?;
        self.connect(&host, port)
    }

    /// Liveness check; returns the sentinel text from the agent.
    ///
    /// A fault that says the peer is gone (unavailable or busy) drops the
    /// binding, so a heartbeat discovers a dead peer instead of every
    /// later call failing the same way.
    pub fn ping(&mut self) -> Result<String> {
        let binding = self.binding.as_mut().ok_or(Error::NotConnected)?;
        match binding.call(&Request::Ping) {
            Ok(Response::Pong(banner)) => Ok(banner),
            Ok(Response::Error(e)) => Err(Error::Op(e)),
            Ok(_) => Err(Error::UnexpectedResponse { operation: "ping" }),
            Err(fault) => {
                if fault.is_session_lost() {
                    self.disconnect();
                }
                Err(Error::Fault(fault))
            }
        }
    }

    /// Executes a command remotely with output captured.
    ///
    /// Blocks until the remote process exits; there is no timeout.
    pub fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        let req = Request::Exec {
            command: command.to_owned(),
        };
        match self.binding_mut()?.call(&req)? {
            Response::Exec { code, output } => Ok(ExecOutput { code, output }),
            Response::Error(e) => Err(Error::Op(e)),
            _ => Err(Error::UnexpectedResponse { operation: "exec" }),
        }
    }

    /// Executes a command remotely without capturing output.
    pub fn exec_silent(&mut self, command: &str) -> Result<i32> {
        let req = Request::ExecSilent {
            command: command.to_owned(),
        };
        match self.binding_mut()?.call(&req)? {
            Response::Exit(code) => Ok(code),
            Response::Error(e) => Err(Error::Op(e)),
            _ => Err(Error::UnexpectedResponse {
                operation: "exec_silent",
            }),
        }
    }

    /// Uploads a byte buffer to `remote_path` on the agent.
    ///
    /// An empty path, an empty buffer, or a buffer at or above the
    /// transfer cap is rejected before any transport I/O.
    pub fn upload(&mut self, remote_path: &str, data: Vec<u8>) -> Result<()> {
        let binding = self.binding_mut()?;
        if remote_path.is_empty() || data.is_empty() {
            return Err(Error::Op(OpError::InvalidParameter));
        }
        if data.len() as u64 >= MAX_TRANSFER_BYTES {
            return Err(Error::Op(OpError::FileTooLarge));
        }
        let req = Request::Upload {
            path: remote_path.to_owned(),
            data: Payload::from(data),
        };
        match binding.call(&req)? {
            Response::Uploaded => Ok(()),
            Response::Error(e) => Err(Error::Op(e)),
            _ => Err(Error::UnexpectedResponse {
                operation: "upload",
            }),
        }
    }

    /// Reads a local file and uploads it to `remote_path`.
    ///
    /// The transfer bounds apply locally before anything is sent: an
    /// empty file is an invalid parameter, a file at or above the cap is
    /// too large, and a failed buffer allocation is out-of-memory. The
    /// local handle closes on every path.
    pub fn upload_path(&mut self, local: impl AsRef<Path>, remote_path: &str) -> Result<()> {
        if self.binding.is_none() {
            return Err(Error::NotConnected);
        }
        let data = read_bounded(local.as_ref())?;
        self.upload(remote_path, data)
    }

    /// Downloads `remote_path`, returning the transferred buffer.
    ///
    /// The returned [`Payload`] is owned by the caller and released
    /// exactly once, by dropping it or consuming [`Payload::into_bytes`].
    pub fn download(&mut self, remote_path: &str) -> Result<Payload> {
        let binding = self.binding_mut()?;
        if remote_path.is_empty() {
            return Err(Error::Op(OpError::InvalidParameter));
        }
        let req = Request::Download {
            path: remote_path.to_owned(),
        };
        match binding.call(&req)? {
            Response::File(payload) => Ok(payload),
            Response::Error(e) => Err(Error::Op(e)),
            _ => Err(Error::UnexpectedResponse {
                operation: "download",
            }),
        }
    }

    /// Downloads `remote_path` and writes it to a local file.
    pub fn download_path(&mut self, remote_path: &str, local: impl AsRef<Path>) -> Result<()> {
        let payload = self.download(remote_path)?;
        std::fs::write(local, payload.into_bytes()).map_err(|e| Error::Op(OpError::from_io(&e)))
    }

    /// Lists a remote directory; `None` lists the agent's current
    /// directory. Returns the rendered listing text.
    pub fn list_dir(&mut self, path: Option<&str>) -> Result<String> {
        let req = Request::List {
            path: path.filter(|p| !p.is_empty()).map(str::to_owned),
        };
        match self.binding_mut()?.call(&req)? {
            Response::Listing(text) => Ok(text),
            Response::Error(e) => Err(Error::Op(e)),
            _ => Err(Error::UnexpectedResponse { operation: "list" }),
        }
    }

    /// Asks the agent to shut down.
    ///
    /// Fire-and-forget: no response frame is read, and the session is
    /// forced to disconnected afterwards whatever the outcome — the
    /// server is assumed to be terminating.
    pub fn shutdown(&mut self) -> Result<()> {
        let result = self.binding_mut()?.send(&Request::Shutdown);
        self.disconnect();
        result.map_err(Error::from)
    }

    /// The live binding, or [`Error::NotConnected`] without touching the
    /// transport.
    fn binding_mut(&mut self) -> Result<&mut Binding> {
        self.binding.as_mut().ok_or(Error::NotConnected)
    }
}

/// Reads a local file for upload, applying the transfer bounds.
fn read_bounded(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| Error::Op(OpError::from_io(&e)))?;
    let size = file
        .metadata()
        .map_err(|e| Error::Op(OpError::from_io(&e)))?
        .len();
    if size == 0 {
        return Err(Error::Op(OpError::InvalidParameter));
    }
    if size >= MAX_TRANSFER_BYTES {
        return Err(Error::Op(OpError::FileTooLarge));
    }
    let size = usize::try_from(size).map_err(|_| Error::Op(OpError::FileTooLarge))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| Error::Op(OpError::OutOfMemory))?;
    file.read_to_end(&mut buf)
        .map_err(|e| Error::Op(OpError::from_io(&e)))?;
    Ok(buf)
}
