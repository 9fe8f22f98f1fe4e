//! # Content client
//!
//! Resolves a virtual path on a game server to the bytes of its blob:
//!
//! ```text
//! GET  {server}/info        -> BuildInfo (ACZ or external hosting)
//! GET  {manifest_url}       -> manifest text -> Manifest
//!      Manifest::resolve    -> blob index (no network)
//! POST {download_url}       -> framed response -> decoded blob
//! ```
//!
//! Every stage needs the previous stage's output, so they run strictly in
//! order. A missing path is reported before the download endpoint is
//! contacted.
//!
//! ```rust,no_run
//! use acz_protocol::{ClientConfig, ContentClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ContentClient::new(ClientConfig::default())?;
//!     let bytes = client
//!         .fetch_file("http://localhost:1212", "Textures/a.png")
//!         .await?;
//!     println!("{} bytes", bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! When several files are needed, open a [`ContentSession`] once and reuse its
//! parsed manifest.

mod download;
mod frame;
mod info;
mod manifest;

pub use download::{BlobDownloader, ProtocolRange};
pub use frame::{Blob, DownloadState, FrameReader};
pub use info::{BuildInfo, ContentEndpoints, InfoClient};
pub use manifest::{FetchedManifest, ManifestFetcher};

use acz_formats::Manifest;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::transport::{HttpClient, HttpConfig};

/// Entry point for resolving and downloading server content
///
/// Cheap to clone; clones share one connection pool. Independent resolutions
/// share no other state and may run concurrently.
#[derive(Clone, Debug)]
pub struct ContentClient {
    info: InfoClient,
    manifests: ManifestFetcher,
    downloader: BlobDownloader,
    config: Arc<ClientConfig>,
}

impl ContentClient {
    /// Create a client with its own HTTP transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::with_config(&HttpConfig::from(&config))?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client on an existing transport
    pub fn with_http_client(config: ClientConfig, http: HttpClient) -> Self {
        Self {
            info: InfoClient::new(http.clone()),
            manifests: ManifestFetcher::new(http.clone(), config.accept_zstd),
            downloader: BlobDownloader::new(http, config.accept_zstd),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch `{server}/info`
    pub async fn build_info(&self, server: &str) -> Result<BuildInfo> {
        self.info.fetch(server).await
    }

    /// Fetch the manifest text for a resolved build
    pub async fn fetch_manifest(&self, server: &str, info: &BuildInfo) -> Result<FetchedManifest> {
        self.manifests.fetch(info, server).await
    }

    /// Resolve build info and manifest for `server`
    pub async fn open(&self, server: &str) -> Result<ContentSession> {
        let build_info = self.build_info(server).await?;
        let fetched = self.fetch_manifest(server, &build_info).await?;
        let manifest = fetched.parse()?;

        if self.config.probe_protocol {
            self.downloader.check_protocol(&fetched.download_url).await?;
        }

        Ok(ContentSession {
            build_info,
            manifest,
            download_url: fetched.download_url,
            downloader: self.downloader.clone(),
        })
    }

    /// Resolve `path` on `server` and return the blob's final bytes
    pub async fn fetch_file(&self, server: &str, path: &str) -> Result<Vec<u8>> {
        self.open(server).await?.fetch(path).await
    }
}

/// A build's parsed manifest bound to its download endpoint
#[derive(Debug, Clone)]
pub struct ContentSession {
    build_info: BuildInfo,
    manifest: Manifest,
    download_url: String,
    downloader: BlobDownloader,
}

impl ContentSession {
    pub fn build_info(&self) -> &BuildInfo {
        &self.build_info
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Download the blob for `path`
    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let index = self.manifest.resolve(path)?;
        tracing::debug!(path, index, "Resolved manifest path");
        self.fetch_index(index).await
    }

    /// Download the blob at a manifest index
    pub async fn fetch_index(&self, index: u32) -> Result<Vec<u8>> {
        self.manifest.check_index(index)?;
        let blob = self.downloader.download(&self.download_url, index).await?;
        Ok(blob.data)
    }

    /// Download several paths in one request, in the order given
    pub async fn fetch_many<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<Vec<u8>>> {
        let indices = self.manifest.resolve_many(paths)?;
        let blobs = self
            .downloader
            .download_many(&self.download_url, &indices)
            .await?;
        Ok(blobs.into_iter().map(|b| b.data).collect())
    }
}
