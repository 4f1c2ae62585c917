//! CLI for the remo remote-operations protocol.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod shell;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use remo::Session;

#[derive(Parser)]
#[command(name = "remo", version, about = "Remote operations client")]
struct Cli {
    /// Agent host name or address.
    #[arg(long, global = true, default_value = "127.0.0.1")]
    host: String,

    /// Agent TCP port.
    #[arg(long, global = true, default_value_t = remo::DEFAULT_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a command on the agent and print its output.
    Exec {
        /// Command line to run remotely.
        command: String,
    },

    /// Ask the agent to shut down.
    Shutdown,

    /// Start the interactive shell.
    Shell,

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = Cli::parse().dispatch() {
        eprintln!("remo: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        match self.command {
            Command::Exec { ref command } => self.exec_once(command),
            Command::Shutdown => self.shutdown_once(),
            Command::Shell => shell::run(&self.host, self.port),
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "remo", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    /// One-shot execution; the process exit code mirrors the remote one.
    fn exec_once(&self, command: &str) -> Result<()> {
        let mut session = Session::new();
        session.connect(&self.host, self.port)?;
        let out = session.exec(command)?;
        print!("{}", out.output);
        if out.code != 0 {
            std::process::exit(out.code);
        }
        Ok(())
    }

    fn shutdown_once(&self) -> Result<()> {
        let mut session = Session::new();
        session.connect(&self.host, self.port)?;
        session.shutdown()?;
        println!("shutdown sent");
        Ok(())
    }
}
