//! File transfer and directory listing collaborators.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use remo_proto::{MAX_TRANSFER_BYTES, OpError};

/// Writes an uploaded buffer to `path`, creating or truncating the file.
///
/// OS errors are surfaced verbatim as the status. The handle closes on
/// every exit path.
pub fn write_file(path: &str, data: &[u8]) -> Result<(), OpError> {
    if path.is_empty() || data.is_empty() {
        return Err(OpError::InvalidParameter);
    }
    if data.len() as u64 >= MAX_TRANSFER_BYTES {
        return Err(OpError::FileTooLarge);
    }
    let mut file = File::create(path).map_err(|e| OpError::from_io(&e))?;
    file.write_all(data).map_err(|e| OpError::from_io(&e))?;
    Ok(())
}

/// Reads the whole file at `path` into a freshly allocated buffer.
///
/// The size is checked against [`MAX_TRANSFER_BYTES`] before anything is
/// allocated, and allocation failure is reported as out-of-memory rather
/// than an I/O error. A failed read drops the partial buffer; the handle
/// closes on every exit path.
pub fn read_file(path: &str) -> Result<Vec<u8>, OpError> {
    if path.is_empty() {
        return Err(OpError::InvalidParameter);
    }
    let mut file = File::open(path).map_err(|e| OpError::from_io(&e))?;
    let size = file.metadata().map_err(|e| OpError::from_io(&e))?.len();
    if size >= MAX_TRANSFER_BYTES {
        return Err(OpError::FileTooLarge);
    }
    let size = usize::try_from(size).map_err(|_| OpError::FileTooLarge)?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| OpError::OutOfMemory)?;
    file.read_to_end(&mut buf).map_err(|e| OpError::from_io(&e))?;
    Ok(buf)
}

/// Renders a line-oriented listing of `path`, or of the agent's current
/// directory when no path is given.
///
/// Every entry is classified as exactly one of `[DIR]` or `[FILE]`;
/// the implicit self and parent entries never appear. Entry order is the
/// OS enumeration order.
pub fn list_directory(path: Option<&str>) -> Result<String, OpError> {
    let dir = match path {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => std::env::current_dir().map_err(|e| OpError::from_io(&e))?,
    };

    let entries = fs::read_dir(&dir).map_err(|e| OpError::from_io(&e))?;
    let mut out = String::from("Directory listing:\n");
    for entry in entries {
        let entry = entry.map_err(|e| OpError::from_io(&e))?;
        let kind = entry.file_type().map_err(|e| OpError::from_io(&e))?;
        out.push_str(if kind.is_dir() { "[DIR]  " } else { "[FILE] " });
        out.push_str(&entry.file_name().to_string_lossy());
        out.push('\n');
    }
    Ok(out)
}
