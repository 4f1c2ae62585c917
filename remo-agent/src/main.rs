//! remo agent binary.
//!
//! Binds a TCP listener and services remote-operations calls until a
//! client requests shutdown.

use std::net::TcpListener;

use anyhow::{Context, Result};
use clap::Parser;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "remo-agent", version, about = "Remote operations agent")]
struct Args {
    /// Socket address to listen on.
    #[arg(long, default_value_t = format!("0.0.0.0:{}", remo_proto::DEFAULT_PORT))]
    bind: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let listener =
        TcpListener::bind(&args.bind).with_context(|| format!("failed to bind {}", args.bind))?;
    remo_agent::serve(listener).context("agent stopped with an error")?;
    Ok(())
}
