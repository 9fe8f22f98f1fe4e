use thiserror::Error;

/// Errors produced while parsing or querying a content manifest
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// An entry line did not contain both a hash and a path
    #[error("malformed manifest entry on line {line}: {content:?}")]
    MalformedEntry {
        /// One-based line number in the manifest text
        line: usize,
        /// The offending line
        content: String,
    },

    /// The manifest has more entries than a `u32` index can address
    #[error("manifest has too many entries ({0})")]
    TooManyEntries(usize),

    /// No entry's path equals the requested path
    #[error("path not found in manifest: {path}")]
    PathNotFound {
        /// The path that was looked up
        path: String,
    },

    /// A blob index is outside the manifest
    #[error("manifest index {index} out of bounds (manifest has {len} entries)")]
    IndexOutOfBounds {
        /// Requested index
        index: u32,
        /// Number of entries in the manifest
        len: usize,
    },
}
