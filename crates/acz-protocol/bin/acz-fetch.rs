//! acz-fetch binary entry point.
//!
//! Thin wrapper around the acz-protocol library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Downloads one file
//! 4. Writes it to disk once the download has fully succeeded

use acz_protocol::output::{default_output_name, write_atomic};
use acz_protocol::{ClientConfig, ContentClient};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Download a single file from a Robust server's client content
#[derive(Debug, Parser)]
#[command(name = "acz-fetch", version)]
struct Args {
    /// Server base URL, e.g. http://localhost:1212
    server: String,

    /// Virtual path of the file in the build manifest
    file_path: String,

    /// Output file (defaults to the last segment of FILE_PATH)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not ask the server for zstd-encoded responses
    #[arg(long, env = "ACZ_FETCH_NO_ZSTD")]
    no_zstd: bool,

    /// Check the download endpoint's protocol version first
    #[arg(long, env = "ACZ_FETCH_PROBE")]
    probe: bool,

    /// Whole-request timeout in seconds (0 disables)
    #[arg(long, env = "ACZ_FETCH_TIMEOUT")]
    timeout: Option<u64>,

    /// Connection timeout in seconds
    #[arg(long, env = "ACZ_FETCH_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if self.no_zstd {
            config.accept_zstd = false;
        }
        if self.probe {
            config.probe_protocol = true;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout = Duration::from_secs(secs);
        }
        config
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_output_name(&self.file_path)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = args.output_path();
    let client = ContentClient::new(args.client_config()).context("Failed to create client")?;

    tracing::info!("Fetching {} from {}", args.file_path, args.server);

    let bytes = client
        .fetch_file(&args.server, &args.file_path)
        .await
        .with_context(|| format!("Failed to fetch {} from {}", args.file_path, args.server))?;

    write_atomic(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
