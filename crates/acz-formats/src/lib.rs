//! Content manifest and download frame formats for the Robust ACZ protocol
//!
//! This crate provides symmetric (parser and builder) implementations for the
//! formats a game server exposes when it hosts its own client content
//! ("Automatic Client Zip", ACZ), or when it points clients at an external
//! build manifest.
//!
//! # Supported Formats
//!
//! - **Manifest**: newline-delimited text; a header line followed by
//!   `<hash> <path>` entries whose line order defines each blob's index
//! - **Download request**: a sequence of little-endian `u32` blob indices
//! - **Download response**: a `u32` stream flag word, then for each requested
//!   blob a `u32` file length, an optional `u32` compressed length and the blob
//!   bytes
//!
//! # Example
//!
//! ```
//! use acz_formats::manifest::Manifest;
//!
//! let manifest = Manifest::parse("v1\nabc123 Textures/a.png\ndef456 Sound/b.ogg\n")
//!     .expect("Test operation should succeed");
//! assert_eq!(manifest.resolve("Sound/b.ogg").expect("Test operation should succeed"), 1);
//! ```

#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]

/// Binary download request and response framing
///
/// Encodes index requests, describes the per-blob frame headers and
/// decodes (optionally zstd-compressed) payloads while enforcing the declared
/// lengths.
pub mod download;
pub mod manifest;

pub use download::{
    DownloadResponseBuilder, FileHeader, FrameError, FrameStage, StreamFlags, decode_payload,
    encode_request,
};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
