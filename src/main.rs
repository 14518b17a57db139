//! Command-line TN3270 client
//!
//! Connects to a host, prints the screen after every record, and optionally
//! waits for a piece of text to appear.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;
use tokio::io::AsyncRead;

use tn3270r::config::default_config_path;
use tn3270r::error::NetworkError;
use tn3270r::{Session3270, SessionConfig, SessionReader, TN3270Error, TN3270Result};

#[derive(Parser)]
#[command(name = "tn3270r")]
#[command(version)]
#[command(about = "TN3270 client for IBM mainframe systems")]
struct Cli {
    /// Host to connect to
    #[arg(long)]
    host: Option<String>,

    /// Host port
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a JSON session configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for --wait-for text
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    /// Exit 0 once this text is on the screen, 1 if it never shows
    #[arg(long, value_name = "TEXT")]
    wait_for: Option<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                info!("Using configuration from {}", path.display());
                SessionConfig::load_from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?
            } else {
                SessionConfig::default()
            }
        }
    };

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

/// Print the screen after every record until the session ends
async fn print_records<R>(mut reader: SessionReader<R>, session: Session3270) -> TN3270Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        match reader.read_next_record().await {
            Ok(outcome) => {
                println!("--- {:?} ---", outcome.command);
                println!("{}", session.screen().await);
            }
            Err(TN3270Error::Network(NetworkError::ConnectionClosed)) => {
                info!("Host closed the connection");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let (session, reader) = tn3270r::connect(&config)
        .await
        .with_context(|| format!("connecting to {}:{}", config.host, config.port))?;
    info!("Session {} established", session.id());

    let Some(text) = cli.wait_for else {
        print_records(reader, session).await?;
        return Ok(());
    };

    let printer = tokio::spawn(print_records(reader, session.clone()));
    let found = session
        .wait_for_text(&text, Duration::from_secs(cli.timeout))
        .await;
    printer.abort();

    if !found {
        eprintln!("Text {:?} did not appear within {}s", text, cli.timeout);
        std::process::exit(1);
    }
    Ok(())
}
