//! TCP listener and per-connection session loop.

use std::io::{self, BufReader, BufWriter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use remo_proto::Request;
use tracing::{debug, info, warn};

use crate::dispatch;

/// Cross-connection shutdown signal.
///
/// Any session may trigger it; the accept loop observes it on its next
/// wakeup. Triggering also connects once to the listener's own address so
/// an accept blocked in the kernel returns.
struct ShutdownSignal {
    /// Set once a client requested shutdown.
    requested: AtomicBool,
    /// The listener's own address, used to wake the accept loop.
    addr: SocketAddr,
}

impl ShutdownSignal {
    /// Flags shutdown and wakes the accept loop.
    fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        // A wildcard bind address is not connectable; aim the wake
        // connection at loopback instead. The connection is discarded.
        let mut addr = self.addr;
        if addr.ip().is_unspecified() {
            addr.set_ip(match addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            });
        }
        let _ = TcpStream::connect(addr);
    }
}

/// Serves connections on `listener` until a client requests shutdown.
///
/// Each accepted connection runs on its own thread; calls on different
/// connections are fully independent. Returns once shutdown is requested
/// and no new connections are being accepted; sessions already in flight
/// keep their threads until their client disconnects.
pub fn serve(listener: TcpListener) -> io::Result<()> {
    let signal = Arc::new(ShutdownSignal {
        requested: AtomicBool::new(false),
        addr: listener.local_addr()?,
    });
    info!(addr = %signal.addr, "listening");

    for conn in listener.incoming() {
        if signal.requested.load(Ordering::SeqCst) {
            info!("shutdown requested, no longer accepting calls");
            return Ok(());
        }
        let stream = conn?;
        let sig = Arc::clone(&signal);
        thread::spawn(move || {
            if let Err(e) = session(stream, &sig) {
                warn!("session error: {e}");
            }
        });
    }
    Ok(())
}

/// Handles one client connection: read requests, dispatch, respond.
fn session(stream: TcpStream, signal: &ShutdownSignal) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    debug!(%peer, "client connected");

    let mut r = BufReader::new(stream.try_clone()?);
    let mut w = BufWriter::new(stream);

    loop {
        let req: Request = match remo_proto::decode(&mut r) {
            Ok(req) => req,
            // Clean disconnect.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!(%peer, "client disconnected");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        // Shutdown carries no response frame; the client infers success
        // from the request write having gone through.
        if matches!(req, Request::Shutdown) {
            info!(%peer, "shutdown requested");
            signal.trigger();
            return Ok(());
        }

        remo_proto::encode(&mut w, &dispatch::dispatch(req))?;
    }
}
