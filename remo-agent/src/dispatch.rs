//! Stateless dispatch of protocol requests to their collaborators.

use remo_proto::{OpError, PONG, Payload, Request, Response};

use crate::{exec, files};

/// Maps one request to its response.
///
/// Collaborator failures come back as in-band [`OpError`] statuses; none
/// of them crosses the session loop as a panic. [`Request::Shutdown`] is
/// intercepted by the session loop and never reaches dispatch.
pub fn dispatch(req: Request) -> Response {
    match req {
        Request::Ping => Response::Pong(PONG.to_owned()),
        Request::Exec { command } => match exec::run_captured(&command) {
            Ok((code, output)) => Response::Exec { code, output },
            Err(e) => Response::Error(e),
        },
        Request::ExecSilent { command } => match exec::run_silent(&command) {
            Ok(code) => Response::Exit(code),
            Err(e) => Response::Error(e),
        },
        Request::Upload { path, data } => match files::write_file(&path, data.as_bytes()) {
            Ok(()) => Response::Uploaded,
            Err(e) => Response::Error(e),
        },
        Request::Download { path } => match files::read_file(&path) {
            Ok(bytes) => Response::File(Payload::from(bytes)),
            Err(e) => Response::Error(e),
        },
        Request::List { path } => match files::list_directory(path.as_deref()) {
            Ok(text) => Response::Listing(text),
            Err(e) => Response::Error(e),
        },
        _ => Response::Error(OpError::InvalidParameter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_answers_with_sentinel() {
        match dispatch(Request::Ping) {
            Response::Pong(banner) => assert_eq!(banner, PONG),
            other => panic!("expected Pong, got {other:?}"),
        }
    }

    #[test]
    fn empty_upload_is_invalid_parameter() {
        let resp = dispatch(Request::Upload {
            path: "/tmp/x".into(),
            data: Payload::from(Vec::new()),
        });
        assert!(matches!(resp, Response::Error(OpError::InvalidParameter)));
    }

    #[test]
    fn empty_command_is_invalid_parameter() {
        let resp = dispatch(Request::Exec {
            command: String::new(),
        });
        assert!(matches!(resp, Response::Error(OpError::InvalidParameter)));
    }
}
