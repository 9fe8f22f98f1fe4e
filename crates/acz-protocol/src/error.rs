//! Error types for content retrieval

use acz_formats::{FrameError, ManifestError};
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a network error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `GET {server}/info`
    BuildInfo,
    /// `GET {manifest_url}`
    Manifest,
    /// `OPTIONS {download_url}`
    Probe,
    /// `POST {download_url}`
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildInfo => write!(f, "build info"),
            Self::Manifest => write!(f, "manifest"),
            Self::Probe => write!(f, "protocol probe"),
            Self::Download => write!(f, "download"),
        }
    }
}

/// Broad classification of a [`ContentError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failure, timeout or non-success HTTP status
    Network,
    /// Malformed server data: build info, manifest lines, binary frames
    Protocol,
    /// The requested path or index is not in the manifest
    ManifestLookup,
    /// Writing the result locally failed
    Io,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP error during {stage}: {source}")]
    Http {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} from {url} during {stage}")]
    HttpStatus {
        stage: Stage,
        url: String,
        status: StatusCode,
    },

    #[error("invalid build info: {0}")]
    InvalidBuildInfo(#[source] serde_json::Error),

    #[error("build info has no {0} and the server is not in ACZ mode")]
    MissingEndpoint(&'static str),

    #[error("invalid manifest document: {0}")]
    InvalidManifestEncoding(String),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("download frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("server supports download protocol {min}..={max}, client speaks {wanted}")]
    UnsupportedProtocol { min: u32, max: u32, wanted: u32 },

    #[error("invalid download request: {0}")]
    InvalidRequest(String),

    #[error("download endpoint sent a missing or invalid {0} header")]
    InvalidProtocolHeader(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(_) | Self::Http { .. } | Self::HttpStatus { .. } => ErrorKind::Network,
            Self::Manifest(
                ManifestError::PathNotFound { .. } | ManifestError::IndexOutOfBounds { .. },
            ) => ErrorKind::ManifestLookup,
            Self::InvalidBuildInfo(_)
            | Self::MissingEndpoint(_)
            | Self::InvalidManifestEncoding(_)
            | Self::Manifest(_)
            | Self::Frame(_)
            | Self::UnsupportedProtocol { .. }
            | Self::InvalidRequest(_)
            | Self::InvalidProtocolHeader(_) => ErrorKind::Protocol,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn http(stage: Stage) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
