//! `sealpipe` command-line tool.
//!
//! ```text
//! sealpipe -l <PORT>            run the encrypted echo server until Ctrl-C
//! sealpipe <PORT> <MESSAGE>     send MESSAGE to localhost:PORT, print the echo
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries only the
//! echoed reply.

#![forbid(unsafe_code)]

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use sealpipe_core::{DialError, StreamConfig, StreamError, TcpConnector, dial};
use sealpipe_server::{Server, ServerConfig, ServerError};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Encrypted echo server and client.
#[derive(Debug, Parser)]
#[command(name = "sealpipe", version, about)]
struct Args {
    /// Listen mode: serve on this port (1-65535)
    #[arg(short = 'l', value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    listen: Option<u16>,

    /// Port of the server on localhost
    #[arg(required_unless_present = "listen", conflicts_with = "listen")]
    port: Option<u16>,

    /// Message to send
    #[arg(required_unless_present = "listen", conflicts_with = "listen")]
    message: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Listen(u16),
    Send { port: u16, message: String },
}

impl Args {
    fn mode(self) -> Result<Mode, CliError> {
        match (self.listen, self.port, self.message) {
            (Some(port), _, _) => Ok(Mode::Listen(port)),
            (None, Some(port), Some(message)) => Ok(Mode::Send { port, message }),
            _ => Err(CliError::Usage),
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("usage: sealpipe -l <PORT> | sealpipe <PORT> <MESSAGE>")]
    Usage,

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Dial(#[from] DialError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("failed to write reply: {0}")]
    Output(#[source] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let result = match Args::parse().mode() {
        Ok(Mode::Listen(port)) => listen(port).await,
        Ok(Mode::Send { port, message }) => send(port, &message, &mut io::stdout().lock()).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal");
            ExitCode::FAILURE
        },
    }
}

async fn listen(port: u16) -> Result<(), CliError> {
    let server = Server::bind(ServerConfig::with_port(port)).await?;
    server.run_until(ctrl_c()).await?;
    info!("server stopped");
    Ok(())
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(err) => {
            warn!(error = %err, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        },
    }
}

async fn send<W: Write>(port: u16, message: &str, out: &mut W) -> Result<(), CliError> {
    let remote = format!("localhost:{port}");
    let mut stream = dial(&TcpConnector, &remote, StreamConfig::default()).await?;

    stream.write(message.as_bytes()).await?;

    let mut reply = vec![0u8; message.len()];
    let n = stream.read(&mut reply).await?;
    writeln!(out, "{}", String::from_utf8_lossy(&reply[..n])).map_err(CliError::Output)?;

    stream.shutdown().await?;
    Ok(())
}
