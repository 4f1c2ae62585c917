//! Interactive shell over a client session.
//!
//! Pure text dispatch: every line is parsed into one protocol client
//! call, and every failure is reported inline without ending the loop.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use remo::{Session, SessionState};

/// Outcome of one dispatched line.
enum Flow {
    Continue,
    Exit,
}

/// Runs the interactive loop until `exit` or end of input.
pub fn run(host: &str, port: u16) -> Result<()> {
    let mut session = Session::new();
    match session.connect(host, port) {
        Ok(()) => println!("connected to {host}:{port}"),
        Err(e) => eprintln!("initial connection failed: {e}"),
    }

    println!("type 'help' for commands, 'exit' to quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("remo> ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(dispatch_line(&mut session, input), Flow::Exit) {
            break;
        }
    }
    Ok(())
}

/// Parses and runs one input line.
fn dispatch_line(session: &mut Session, input: &str) -> Flow {
    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };

    match cmd {
        "exit" | "quit" => return Flow::Exit,
        "help" => print_help(),
        "connect" => connect_cmd(session, rest),
        "disconnect" => {
            session.disconnect();
            println!("disconnected");
        }
        "reconnect" => match session.reconnect() {
            Ok(()) => println!("reconnected"),
            Err(e) => eprintln!("reconnect failed: {e}"),
        },
        "exec" => exec_cmd(session, rest),
        "silent" => silent_cmd(session, rest),
        "upload" => upload_cmd(session, rest),
        "download" => download_cmd(session, rest),
        "ls" => ls_cmd(session, rest),
        "shutdown" => match session.shutdown() {
            Ok(()) => println!("shutdown sent"),
            Err(e) => eprintln!("shutdown failed: {e}"),
        },
        "status" | "ping" => status_cmd(session),
        _ => eprintln!("unknown command, try 'help'"),
    }
    Flow::Continue
}

fn print_help() {
    println!(
        "commands:\n  \
         help                      show this help\n  \
         exit, quit                leave the shell\n  \
         connect [host [port]]     connect to an agent\n  \
         disconnect                drop the connection\n  \
         reconnect                 reconnect to the last agent\n  \
         exec <command>            run a command, print its output\n  \
         silent <command>          run a command without output\n  \
         upload <local> <remote>   send a file to the agent\n  \
         download <remote> <local> fetch a file from the agent\n  \
         ls [path]                 list a remote directory\n  \
         shutdown                  stop the agent\n  \
         status, ping              check the connection"
    );
}

fn connect_cmd(session: &mut Session, rest: &str) {
    let mut parts = rest.split_whitespace();
    let host = parts.next().unwrap_or("127.0.0.1").to_owned();
    let port = match parts.next() {
        Some(p) => match p.parse() {
            Ok(port) => port,
            Err(_) => {
                eprintln!("invalid port: {p}");
                return;
            }
        },
        None => remo::DEFAULT_PORT,
    };

    match session.connect(&host, port) {
        Ok(()) => println!("connected to {host}:{port}"),
        Err(e) => eprintln!("connection failed: {e}"),
    }
}

fn exec_cmd(session: &mut Session, command: &str) {
    if command.is_empty() {
        eprintln!("usage: exec <command>");
        return;
    }
    match session.exec(command) {
        Ok(out) => {
            print!("{}", out.output);
            if out.code != 0 {
                eprintln!("exit code {}", out.code);
            }
        }
        Err(e) => eprintln!("exec failed: {e}"),
    }
}

fn silent_cmd(session: &mut Session, command: &str) {
    if command.is_empty() {
        eprintln!("usage: silent <command>");
        return;
    }
    match session.exec_silent(command) {
        Ok(0) => println!("command executed"),
        Ok(code) => eprintln!("exit code {code}"),
        Err(e) => eprintln!("silent exec failed: {e}"),
    }
}

fn upload_cmd(session: &mut Session, rest: &str) {
    let mut parts = rest.split_whitespace();
    let (Some(local), Some(remote), None) = (parts.next(), parts.next(), parts.next()) else {
        eprintln!("usage: upload <local> <remote>");
        return;
    };
    match session.upload_path(local, remote) {
        Ok(()) => println!("uploaded {local} -> {remote}"),
        Err(e) => eprintln!("upload failed: {e}"),
    }
}

fn download_cmd(session: &mut Session, rest: &str) {
    let mut parts = rest.split_whitespace();
    let (Some(remote), Some(local), None) = (parts.next(), parts.next(), parts.next()) else {
        eprintln!("usage: download <remote> <local>");
        return;
    };
    match session.download_path(remote, local) {
        Ok(()) => println!("downloaded {remote} -> {local}"),
        Err(e) => eprintln!("download failed: {e}"),
    }
}

fn ls_cmd(session: &mut Session, rest: &str) {
    let path = if rest.is_empty() { None } else { Some(rest) };
    match session.list_dir(path) {
        Ok(listing) => print!("{listing}"),
        Err(e) => eprintln!("list failed: {e}"),
    }
}

/// Pings the agent and reports the resulting connection state.
///
/// A ping fault can drop the binding, so the state is read afterwards.
fn status_cmd(session: &mut Session) {
    if !session.is_connected() {
        println!("not connected");
        return;
    }
    match session.ping() {
        Ok(banner) => println!("agent responded: {banner}"),
        Err(e) => eprintln!("ping failed: {e}"),
    }
    match session.state() {
        SessionState::Connected => println!("connected"),
        _ => println!("disconnected"),
    }
}
