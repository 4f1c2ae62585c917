//! End-to-end session tests driving the real agent over loopback TCP.

use std::io::{BufReader, BufWriter};
use std::net::TcpListener;
use std::thread;

use remo::{Error, OpError, PONG, Session, SessionState};
use remo_proto::{Request, Response};

/// Starts the real agent on an ephemeral loopback port.
fn spawn_agent() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let _ = remo_agent::serve(listener);
    });
    port
}

/// A reachable peer that answers the liveness call with the wrong sentinel.
fn spawn_imposter() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut r = BufReader::new(stream.try_clone().unwrap());
        let mut w = BufWriter::new(stream);
        let _req: Request = remo_proto::decode(&mut r).unwrap();
        remo_proto::encode(&mut w, &Response::Pong("NOT_THE_SENTINEL".into())).unwrap();
    });
    port
}

/// A peer that completes the handshake, then drops the connection.
fn spawn_vanishing_peer() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut r = BufReader::new(stream.try_clone().unwrap());
        let mut w = BufWriter::new(stream);
        let _req: Request = remo_proto::decode(&mut r).unwrap();
        remo_proto::encode(&mut w, &Response::Pong(PONG.to_owned())).unwrap();
        // Connection drops here.
    });
    port
}

#[test]
fn connect_fails_when_unreachable() {
    // Grab a port with no listener behind it.
    let port = {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let mut session = Session::new();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, Error::Fault(_)));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn connect_rejects_reachable_peer_without_sentinel() {
    let port = spawn_imposter();

    let mut session = Session::new();
    let err = session.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, Error::Handshake { .. }));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn connect_then_ping_returns_sentinel() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    assert!(session.is_connected());
    assert_eq!(session.ping().unwrap(), PONG);
    assert_eq!(session.state(), SessionState::Connected);
}

#[cfg(unix)]
#[test]
fn exec_roundtrip_captures_output_and_code() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();

    let out = session.exec("echo roundtrip").unwrap();
    assert_eq!(out.code, 0);
    assert!(out.output.contains("roundtrip"));

    let out = session.exec("exit 5").unwrap();
    assert_eq!(out.code, 5);
}

#[cfg(unix)]
#[test]
fn exec_silent_returns_only_the_exit_code() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    assert_eq!(session.exec_silent("true").unwrap(), 0);
    assert_eq!(session.exec_silent("exit 3").unwrap(), 3);
}

#[test]
fn exec_empty_command_is_rejected_and_session_survives() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();

    let err = session.exec("").unwrap_err();
    assert!(matches!(err, Error::Op(OpError::InvalidParameter)));
    // An in-band status leaves the connection state untouched.
    assert_eq!(session.state(), SessionState::Connected);
}

#[test]
fn upload_download_roundtrip_is_byte_identical() {
    let port = spawn_agent();
    let dir = tempfile::tempdir().unwrap();
    let remote = dir.path().join("transferred.bin");
    let remote = remote.to_str().unwrap();

    let data: Vec<u8> = (0..4096u32).flat_map(u32::to_le_bytes).collect();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    session.upload(remote, data.clone()).unwrap();

    let payload = session.download(remote).unwrap();
    assert_eq!(payload.into_bytes(), data);
}

#[test]
fn upload_path_and_download_path_roundtrip() {
    let port = spawn_agent();
    let dir = tempfile::tempdir().unwrap();
    let local_src = dir.path().join("src.bin");
    let remote = dir.path().join("remote.bin");
    let local_dst = dir.path().join("dst.bin");
    std::fs::write(&local_src, b"payload crossing the wire twice").unwrap();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    session
        .upload_path(&local_src, remote.to_str().unwrap())
        .unwrap();
    session
        .download_path(remote.to_str().unwrap(), &local_dst)
        .unwrap();

    assert_eq!(
        std::fs::read(&local_src).unwrap(),
        std::fs::read(&local_dst).unwrap()
    );
}

#[test]
fn zero_byte_upload_is_rejected() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    let err = session.upload("/tmp/never-created", Vec::new()).unwrap_err();
    assert!(matches!(err, Error::Op(OpError::InvalidParameter)));

    let err = session.upload("", vec![1]).unwrap_err();
    assert!(matches!(err, Error::Op(OpError::InvalidParameter)));
}

#[test]
fn upload_of_empty_local_file_is_rejected() {
    let port = spawn_agent();
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("empty");
    std::fs::write(&local, b"").unwrap();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    let err = session
        .upload_path(&local, dir.path().join("dst").to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::Op(OpError::InvalidParameter)));
}

#[test]
fn download_missing_file_surfaces_os_error() {
    let port = spawn_agent();
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent");

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    match session.download(absent.to_str().unwrap()).unwrap_err() {
        Error::Op(OpError::Io { code, .. }) => assert!(code.is_some()),
        other => panic!("expected Io status, got {other:?}"),
    }
}

#[test]
fn listing_classifies_entries_and_skips_self_parent() {
    let port = spawn_agent();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("plain.txt"), b"x").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    let listing = session.list_dir(dir.path().to_str()).unwrap();

    assert!(listing.contains("[FILE] plain.txt"));
    assert!(listing.contains("[DIR]  nested"));
    for line in listing.lines().skip(1) {
        let name = line
            .strip_prefix("[DIR]  ")
            .or_else(|| line.strip_prefix("[FILE] "))
            .unwrap();
        assert_ne!(name, ".");
        assert_ne!(name, "..");
    }
}

#[test]
fn ping_fault_detects_dead_peer_and_releases_binding() {
    let port = spawn_vanishing_peer();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    assert!(session.is_connected());

    let err = session.ping().unwrap_err();
    match err {
        Error::Fault(fault) => assert!(fault.is_session_lost()),
        other => panic!("expected a fault, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Disconnected);

    // A second disconnect is a no-op.
    session.disconnect();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn shutdown_always_leaves_the_session_disconnected() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    session.shutdown().unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn shutdown_disconnects_even_when_the_peer_is_already_gone() {
    let port = spawn_vanishing_peer();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    // The peer dropped the connection; whether the write still lands in
    // the socket buffer or faults, the session ends up disconnected.
    let _ = session.shutdown();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn reconnect_restores_the_last_endpoint() {
    let port = spawn_agent();

    let mut session = Session::new();
    session.connect("127.0.0.1", port).unwrap();
    session.disconnect();
    assert_eq!(session.state(), SessionState::Disconnected);

    session.reconnect().unwrap();
    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(session.ping().unwrap(), PONG);
}
