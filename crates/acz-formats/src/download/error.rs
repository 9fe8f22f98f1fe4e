use std::fmt;
use thiserror::Error;

/// Position in the download response at which a frame error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// Leading stream flag word
    StreamFlags,
    /// Per-blob decompressed length
    FileLength {
        /// Position of the blob within the request
        blob: usize,
    },
    /// Per-blob compressed length, present when the stream is pre-compressed
    CompressedLength {
        /// Position of the blob within the request
        blob: usize,
    },
    /// Raw blob bytes
    Payload {
        /// Position of the blob within the request
        blob: usize,
    },
    /// Decompression and length validation of a received blob
    Decode {
        /// Position of the blob within the request
        blob: usize,
    },
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamFlags => write!(f, "stream flags"),
            Self::FileLength { blob } => write!(f, "file length of blob {blob}"),
            Self::CompressedLength { blob } => write!(f, "compressed length of blob {blob}"),
            Self::Payload { blob } => write!(f, "payload of blob {blob}"),
            Self::Decode { blob } => write!(f, "decoding of blob {blob}"),
        }
    }
}

/// Malformed, truncated or inconsistent download frames
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended before a field or payload was complete
    #[error("stream ended while reading {stage}: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Field being read
        stage: FrameStage,
        /// Bytes the frame declared
        expected: u64,
        /// Bytes actually received
        actual: u64,
    },

    /// A decoded blob does not have the declared length
    #[error("length mismatch in {stage}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Where the mismatch was found
        stage: FrameStage,
        /// Declared file length
        expected: u64,
        /// Length actually produced
        actual: u64,
    },

    /// zstd rejected the blob
    #[error("failed to decompress blob {blob}: {source}")]
    Decompress {
        /// Position of the blob within the request
        blob: usize,
        /// Underlying decoder error
        #[source]
        source: std::io::Error,
    },

    /// The underlying stream failed for a reason other than ending early
    #[error("I/O error while reading {stage}: {source}")]
    Io {
        /// Field being read
        stage: FrameStage,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl FrameError {
    /// Stage the error is attributed to
    pub fn stage(&self) -> FrameStage {
        match self {
            Self::Truncated { stage, .. }
            | Self::LengthMismatch { stage, .. }
            | Self::Io { stage, .. } => *stage,
            Self::Decompress { blob, .. } => FrameStage::Decode { blob: *blob },
        }
    }
}
