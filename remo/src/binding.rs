//! The transport binding resource.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use remo_proto::{Request, Response};

use crate::error::Fault;

/// One live call channel to an agent.
///
/// Owns the underlying stream exclusively; dropping it releases the
/// transport resource, so every exit path — disconnect, reconnect,
/// session drop — tears the connection down.
#[derive(Debug)]
pub(crate) struct Binding {
    /// Buffered read half.
    reader: BufReader<TcpStream>,
    /// Buffered write half.
    writer: BufWriter<TcpStream>,
}

impl Binding {
    /// Opens a transport connection to `addr`.
    pub fn open(addr: impl ToSocketAddrs) -> Result<Self, Fault> {
        let stream = TcpStream::connect(addr).map_err(Fault::classify)?;
        let reader = BufReader::new(stream.try_clone().map_err(Fault::classify)?);
        Ok(Self {
            reader,
            writer: BufWriter::new(stream),
        })
    }

    /// Performs one blocking request/response exchange.
    pub fn call(&mut self, req: &Request) -> Result<Response, Fault> {
        remo_proto::encode(&mut self.writer, req).map_err(Fault::classify)?;
        remo_proto::decode(&mut self.reader).map_err(Fault::classify)
    }

    /// Sends a request without waiting for a response.
    pub fn send(&mut self, req: &Request) -> Result<(), Fault> {
        remo_proto::encode(&mut self.writer, req).map_err(Fault::classify)
    }
}
