//! Index-addressed blob downloads (`POST {download_url}`)

use acz_formats::download::{
    MAX_PROTOCOL_HEADER, MIN_PROTOCOL_HEADER, PROTOCOL_HEADER, PROTOCOL_VERSION,
};
use acz_formats::{FrameError, encode_request};
use futures::TryStreamExt;
use reqwest::Method;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE, HeaderMap};
use std::collections::HashSet;
use std::io;
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use super::frame::{Blob, FrameReader};
use super::manifest::is_zstd_encoded;
use crate::error::{ContentError, Result, Stage};
use crate::transport::HttpClient;

/// Protocol versions a download endpoint advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolRange {
    pub min: u32,
    pub max: u32,
}

impl ProtocolRange {
    pub fn supports(&self, version: u32) -> bool {
        (self.min..=self.max).contains(&version)
    }
}

/// Downloads blobs from a build's download endpoint
#[derive(Clone, Debug)]
pub struct BlobDownloader {
    http: HttpClient,
    accept_zstd: bool,
}

impl BlobDownloader {
    pub fn new(http: HttpClient, accept_zstd: bool) -> Self {
        Self { http, accept_zstd }
    }

    /// Download and decode the blob at `index`
    pub async fn download(&self, url: &str, index: u32) -> Result<Blob> {
        let mut blobs = self.download_many(url, &[index]).await?;
        blobs
            .pop()
            .ok_or_else(|| ContentError::InvalidRequest("no blob returned".to_string()))
    }

    /// Download several blobs in one request, returned in request order
    ///
    /// Indices must be distinct; the server refuses duplicate requests.
    pub async fn download_many(&self, url: &str, indices: &[u32]) -> Result<Vec<Blob>> {
        validate_indices(indices)?;

        tracing::debug!(url, count = indices.len(), "Download request");

        let mut request = self
            .http
            .inner()
            .post(url)
            .header(PROTOCOL_HEADER, PROTOCOL_VERSION.to_string())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(encode_request(indices));
        if self.accept_zstd {
            request = request.header(ACCEPT_ENCODING, "zstd");
        }

        let response = request
            .send()
            .await
            .map_err(ContentError::http(Stage::Download))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::HttpStatus {
                stage: Stage::Download,
                url: url.to_string(),
                status,
            });
        }

        let zstd_encoded = is_zstd_encoded(response.headers());
        let stream = response.bytes_stream().map_err(body_error);
        let reader: Pin<Box<dyn AsyncRead + Send>> = if zstd_encoded {
            tracing::trace!("Download stream is zstd encoded");
            Box::pin(async_compression::tokio::bufread::ZstdDecoder::new(
                StreamReader::new(stream),
            ))
        } else {
            Box::pin(StreamReader::new(stream))
        };

        let mut frames = FrameReader::new(reader);
        let blobs = frames
            .read_response(indices)
            .await
            .map_err(classify_frame_error)?;

        // Extra bytes do not invalidate frames that were read in full
        match frames.drain_trailing().await {
            Ok(0) => {}
            Ok(extra) => tracing::warn!(extra, "Ignoring trailing bytes after download frames"),
            Err(e) => tracing::warn!("Error after final download frame: {}", e),
        }

        Ok(blobs)
    }

    /// Ask the endpoint which protocol versions it speaks (`OPTIONS`)
    pub async fn probe_protocol(&self, url: &str) -> Result<ProtocolRange> {
        tracing::debug!(url, "Probing download protocol");

        let response = self
            .http
            .inner()
            .request(Method::OPTIONS, url)
            .send()
            .await
            .map_err(ContentError::http(Stage::Probe))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::HttpStatus {
                stage: Stage::Probe,
                url: url.to_string(),
                status,
            });
        }

        let headers = response.headers();
        Ok(ProtocolRange {
            min: header_u32(headers, MIN_PROTOCOL_HEADER)?,
            max: header_u32(headers, MAX_PROTOCOL_HEADER)?,
        })
    }

    /// Fail unless the endpoint supports the protocol version spoken here
    pub async fn check_protocol(&self, url: &str) -> Result<()> {
        let range = self.probe_protocol(url).await?;
        if range.supports(PROTOCOL_VERSION) {
            Ok(())
        } else {
            Err(ContentError::UnsupportedProtocol {
                min: range.min,
                max: range.max,
                wanted: PROTOCOL_VERSION,
            })
        }
    }
}

fn validate_indices(indices: &[u32]) -> Result<()> {
    if indices.is_empty() {
        return Err(ContentError::InvalidRequest("no indices requested".to_string()));
    }

    let mut seen = HashSet::with_capacity(indices.len());
    for &index in indices {
        if !seen.insert(index) {
            return Err(ContentError::InvalidRequest(format!(
                "index {index} requested twice"
            )));
        }
    }
    Ok(())
}

fn header_u32(headers: &HeaderMap, name: &'static str) -> Result<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or(ContentError::InvalidProtocolHeader(name))
}

/// Map a body stream error onto the I/O kind the frame reader understands
///
/// A body that stops short of its declared length surfaces from hyper as an
/// error rather than a clean EOF; it is reported as `UnexpectedEof` so the
/// frame reader turns it into a truncation with byte counts.
fn body_error(err: reqwest::Error) -> io::Error {
    let kind = if err.is_timeout() {
        io::ErrorKind::TimedOut
    } else if err.is_connect() {
        io::ErrorKind::ConnectionAborted
    } else {
        io::ErrorKind::UnexpectedEof
    };
    io::Error::new(kind, err)
}

/// Timeouts and connection failures mid-body are network errors, not framing
fn classify_frame_error(err: FrameError) -> ContentError {
    let FrameError::Io { stage, source } = err else {
        return err.into();
    };

    let is_transport = source
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(|e| e.is_timeout() || e.is_connect());
    if !is_transport {
        return FrameError::Io { stage, source }.into();
    }

    match source.into_inner().map(|inner| inner.downcast::<reqwest::Error>()) {
        Some(Ok(source)) => ContentError::Http {
            stage: Stage::Download,
            source: *source,
        },
        Some(Err(inner)) => FrameError::Io {
            stage,
            source: io::Error::other(inner),
        }
        .into(),
        None => FrameError::Io {
            stage,
            source: io::Error::from(io::ErrorKind::Other),
        }
        .into(),
    }
}
