//! Build info resolution (`GET {server}/info`)

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ContentError, Result, Stage};
use crate::transport::HttpClient;

/// Delivery metadata a server publishes about its client build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildInfo {
    /// The server hosts the manifest and download endpoints itself
    pub acz: bool,

    /// Externally hosted manifest, used when `acz` is false
    #[serde(deserialize_with = "empty_as_none")]
    pub manifest_url: Option<String>,

    /// Externally hosted download endpoint, used when `acz` is false
    #[serde(deserialize_with = "empty_as_none")]
    pub manifest_download_url: Option<String>,

    /// Hash of the manifest document, informational only
    #[serde(deserialize_with = "empty_as_none")]
    pub manifest_hash: Option<String>,

    #[serde(deserialize_with = "empty_as_none")]
    pub engine_version: Option<String>,

    #[serde(deserialize_with = "empty_as_none")]
    pub fork_id: Option<String>,

    #[serde(deserialize_with = "empty_as_none")]
    pub version: Option<String>,
}

/// Manifest and download URLs for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEndpoints {
    pub manifest_url: String,
    pub download_url: String,
}

/// The `/info` document. Robust servers nest build data under `build`; a
/// flat document is accepted as well.
#[derive(Deserialize)]
struct InfoDocument {
    #[serde(default)]
    build: Option<BuildInfo>,
    #[serde(flatten)]
    flat: BuildInfo,
}

impl BuildInfo {
    /// Parse an `/info` response body
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let doc: InfoDocument =
            serde_json::from_slice(body).map_err(ContentError::InvalidBuildInfo)?;
        Ok(doc.build.unwrap_or(doc.flat))
    }

    /// Resolve the manifest and download URLs for `server`
    ///
    /// In ACZ mode the server's fixed `/manifest.txt` and `/download` paths
    /// are used and any published URLs are ignored.
    pub fn endpoints(&self, server: &str) -> Result<ContentEndpoints> {
        let server = trim_server(server);

        if self.acz {
            return Ok(ContentEndpoints {
                manifest_url: format!("{server}/manifest.txt"),
                download_url: format!("{server}/download"),
            });
        }

        Ok(ContentEndpoints {
            manifest_url: self
                .manifest_url
                .clone()
                .ok_or(ContentError::MissingEndpoint("manifest_url"))?,
            download_url: self
                .manifest_download_url
                .clone()
                .ok_or(ContentError::MissingEndpoint("manifest_download_url"))?,
        })
    }
}

/// Client for the server's `/info` endpoint
#[derive(Clone, Debug)]
pub struct InfoClient {
    http: HttpClient,
}

impl InfoClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetch and parse `{server}/info`
    pub async fn fetch(&self, server: &str) -> Result<BuildInfo> {
        let url = format!("{}/info", trim_server(server));
        tracing::debug!("Build info request URL: {}", url);

        let response = self
            .http
            .inner()
            .get(&url)
            .send()
            .await
            .map_err(ContentError::http(Stage::BuildInfo))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::HttpStatus {
                stage: Stage::BuildInfo,
                url,
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(ContentError::http(Stage::BuildInfo))?;
        let info = BuildInfo::from_json(&body)?;

        tracing::debug!(
            acz = info.acz,
            version = info.version.as_deref().unwrap_or("unknown"),
            "Resolved build info"
        );
        Ok(info)
    }
}

pub(crate) fn trim_server(server: &str) -> &str {
    server.trim_end_matches('/')
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
