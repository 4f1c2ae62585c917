//! Command execution collaborator.

use std::process::Command;

use remo_proto::OpError;

/// Runs `command` through the platform shell with output captured,
/// blocking until the child exits.
///
/// Returns the exit code (`-1` if killed by a signal) and the combined
/// stdout and stderr decoded to text. There is no timeout: a hung command
/// blocks the call for as long as it runs.
pub fn run_captured(command: &str) -> Result<(i32, String), OpError> {
    if command.is_empty() {
        return Err(OpError::InvalidParameter);
    }
    let out = shell(command).output().map_err(|e| OpError::from_io(&e))?;
    let mut text = decode_output(&out.stdout);
    text.push_str(&decode_output(&out.stderr));
    Ok((out.status.code().unwrap_or(-1), text))
}

/// Runs `command` with the agent's own standard streams inherited,
/// blocking until the child exits. Nothing is captured.
pub fn run_silent(command: &str) -> Result<i32, OpError> {
    if command.is_empty() {
        return Err(OpError::InvalidParameter);
    }
    let status = shell(command).status().map_err(|e| OpError::from_io(&e))?;
    Ok(status.code().unwrap_or(-1))
}

/// Builds the platform shell invocation for a command line.
fn shell(command: &str) -> Command {
    #[cfg(unix)]
    {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(command);
        cmd
    }
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
}

/// Decodes captured process output: strict UTF-8 first, Latin-1 otherwise.
///
/// The fallback maps every byte one-to-one so output from a legacy
/// single-byte code page survives instead of failing the whole call.
fn decode_output(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
