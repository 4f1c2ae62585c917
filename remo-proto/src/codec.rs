//! Length-prefixed frame codec over any `Read`/`Write` stream.
//!
//! Each frame is: `[u64 big-endian length][postcard payload]`.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::MAX_TRANSFER_BYTES;

/// Maximum allowed frame payload: a maximal transfer plus headroom for
/// the envelope around it (paths, tags, length fields).
const MAX_FRAME: u64 = MAX_TRANSFER_BYTES + 64 * 1024;

/// Encodes `msg` as a length-prefixed postcard frame and writes it to `w`.
pub fn encode<W: Write>(w: &mut W, msg: &impl Serialize) -> io::Result<()> {
    let payload =
        postcard::to_allocvec(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = payload.len() as u64;
    if len > MAX_FRAME {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds transfer cap",
        ));
    }
    w.write_all(&len.to_be_bytes())?;
    w.write_all(&payload)?;
    w.flush()
}

/// Reads a length-prefixed postcard frame from `r` and decodes it.
///
/// Frames above the cap are rejected before any allocation, and an
/// allocation failure for the frame buffer is reported as out-of-memory
/// rather than a generic I/O error.
pub fn decode<T: for<'de> Deserialize<'de>>(r: &mut impl Read) -> io::Result<T> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    let len = u64::from_be_bytes(buf);
    if len > MAX_FRAME {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds transfer cap",
        ));
    }
    let len = usize::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame exceeds address space"))?;
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(len)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    r.take(len as u64).read_to_end(&mut payload)?;
    if payload.len() < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    postcard::from_bytes(&payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
