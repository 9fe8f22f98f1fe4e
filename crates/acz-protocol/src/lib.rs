//! # acz-protocol - Robust ACZ content retrieval client
//!
//! Downloads individual files from a Robust game server's client content.
//! The server either hosts the content itself ("Automatic Client Zip", ACZ)
//! or publishes URLs of an external manifest and download endpoint; either
//! way the client:
//!
//! 1. fetches `{server}/info` to learn the delivery mode ([`BuildInfo`])
//! 2. fetches the manifest and parses it ([`acz_formats::Manifest`])
//! 3. resolves the requested path to its positional blob index
//! 4. `POST`s the index to the download endpoint and reads the framed,
//!    optionally zstd-compressed response ([`BlobDownloader`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use acz_protocol::{ClientConfig, ContentClient, ErrorKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ContentClient::new(ClientConfig::from_env())?;
//!
//!     match client.fetch_file("http://localhost:1212", "Textures/a.png").await {
//!         Ok(bytes) => {
//!             acz_protocol::output::write_atomic("a.png".as_ref(), &bytes).await?;
//!         }
//!         Err(e) if e.kind() == ErrorKind::ManifestLookup => {
//!             eprintln!("no such file on this server: {e}");
//!         }
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`ContentError`]; [`ContentError::kind`] sorts it into
//! network, protocol, manifest lookup or local I/O failures. Nothing is
//! retried automatically.
//!
//! ## Environment Variables
//!
//! ```bash
//! export ACZ_CONNECT_TIMEOUT="10"
//! export ACZ_REQUEST_TIMEOUT="120"   # 0 disables
//! export ACZ_ACCEPT_ZSTD="true"
//! export ACZ_PROBE_PROTOCOL="false"
//! export ACZ_USER_AGENT="my-launcher/1.0"
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod transport;

pub use client::{
    Blob, BlobDownloader, BuildInfo, ContentClient, ContentEndpoints, ContentSession,
    DownloadState, FetchedManifest, FrameReader, InfoClient, ManifestFetcher, ProtocolRange,
};
pub use config::ClientConfig;
pub use error::{ContentError, ErrorKind, Result, Stage};
pub use transport::{HttpClient, HttpConfig};
