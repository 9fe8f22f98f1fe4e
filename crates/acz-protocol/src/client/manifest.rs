//! Manifest document retrieval

use acz_formats::Manifest;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, HeaderMap};

use super::info::{BuildInfo, ContentEndpoints};
use crate::error::{ContentError, Result, Stage};
use crate::transport::HttpClient;

/// Manifest text together with the endpoint its blobs are downloaded from
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    pub text: String,
    pub download_url: String,
}

impl FetchedManifest {
    /// Parse the manifest text
    pub fn parse(&self) -> Result<Manifest> {
        let manifest = Manifest::parse(&self.text)?;
        tracing::debug!(
            header = manifest.header(),
            entries = manifest.len(),
            "Parsed manifest"
        );
        Ok(manifest)
    }
}

/// Fetches the manifest document of a build
#[derive(Clone, Debug)]
pub struct ManifestFetcher {
    http: HttpClient,
    accept_zstd: bool,
}

impl ManifestFetcher {
    pub fn new(http: HttpClient, accept_zstd: bool) -> Self {
        Self { http, accept_zstd }
    }

    /// Resolve the build's endpoints and download its manifest
    pub async fn fetch(&self, info: &BuildInfo, server: &str) -> Result<FetchedManifest> {
        let ContentEndpoints {
            manifest_url,
            download_url,
        } = info.endpoints(server)?;

        let text = self.fetch_text(&manifest_url).await?;
        Ok(FetchedManifest { text, download_url })
    }

    /// Download manifest text from `url`
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        tracing::debug!("Manifest request URL: {}", url);

        let mut request = self.http.inner().get(url);
        if self.accept_zstd {
            request = request.header(ACCEPT_ENCODING, "zstd");
        }

        let response = request
            .send()
            .await
            .map_err(ContentError::http(Stage::Manifest))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::HttpStatus {
                stage: Stage::Manifest,
                url: url.to_string(),
                status,
            });
        }

        let zstd_encoded = is_zstd_encoded(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(ContentError::http(Stage::Manifest))?;

        let raw = if zstd_encoded {
            tracing::trace!(compressed = body.len(), "Decoding zstd manifest");
            zstd::decode_all(body.as_ref())
                .map_err(|e| ContentError::InvalidManifestEncoding(format!("zstd: {e}")))?
        } else {
            body.to_vec()
        };

        String::from_utf8(raw).map_err(|e| ContentError::InvalidManifestEncoding(e.to_string()))
    }
}

pub(crate) fn is_zstd_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("zstd"))
}
