//! Content manifest format
//!
//! The manifest is the indirection layer between virtual file paths and the
//! blobs served by the download endpoint. It is plain UTF-8 text:
//!
//! ```text
//! Robust Content Manifest 1
//! 9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08 Textures/a.png
//! 60303AE22B998861BCE3B28F33EEC1BE758A213C86C93C076DBE9F558C11C752 Sound/b.ogg
//! ```
//!
//! The first line is a format token that this crate keeps but does not
//! interpret. Every following non-empty line is `<hash> <path>`, split on the
//! first whitespace run only, so paths may contain spaces. Entries carry no
//! explicit index: the zero-based position of the line among entry lines is
//! the index the download endpoint expects.

mod error;

pub use error::ManifestError;

use std::collections::HashMap;
use std::fmt::Write as _;

/// Header written by Robust servers for the current manifest revision
pub const DEFAULT_HEADER: &str = "Robust Content Manifest 1";

/// A single manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Content hash, opaque to the client
    pub hash: String,
    /// Virtual file path
    pub path: String,
    /// Zero-based position among entry lines
    pub index: u32,
}

/// Parsed content manifest
///
/// Immutable once parsed. Lookups go through a path index built at parse
/// time; when the same path appears twice, the first entry wins.
#[derive(Debug, Clone)]
pub struct Manifest {
    header: String,
    entries: Vec<ManifestEntry>,
    by_path: HashMap<String, u32>,
}

impl Manifest {
    /// Parse manifest text
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let header = lines.next().unwrap_or_default().to_string();

        let mut raw = Vec::new();
        // Line numbers are one-based and the header is line 1
        for (offset, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let (hash, path) = split_entry(line).ok_or_else(|| ManifestError::MalformedEntry {
                line: offset + 2,
                content: line.to_string(),
            })?;
            raw.push((hash.to_string(), path.to_string()));
        }

        Self::from_entries(header, raw)
    }

    /// Build a manifest from `(hash, path)` pairs in index order
    pub fn from_entries<I, H, P>(header: impl Into<String>, entries: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = (H, P)>,
        H: Into<String>,
        P: Into<String>,
    {
        let mut out = Vec::new();
        let mut by_path = HashMap::new();

        for (position, (hash, path)) in entries.into_iter().enumerate() {
            let index =
                u32::try_from(position).map_err(|_| ManifestError::TooManyEntries(position + 1))?;
            let path = path.into();
            by_path.entry(path.clone()).or_insert(index);
            out.push(ManifestEntry {
                hash: hash.into(),
                path,
                index,
            });
        }

        Ok(Self {
            header: header.into(),
            entries: out,
            by_path,
        })
    }

    /// Header line, verbatim
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Entries in index order
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Iterate entries in index order
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    pub fn get(&self, index: u32) -> Option<&ManifestEntry> {
        self.entries.get(index as usize)
    }

    /// Resolve a virtual path to its blob index by exact string match
    pub fn resolve(&self, path: &str) -> Result<u32, ManifestError> {
        self.by_path
            .get(path)
            .copied()
            .ok_or_else(|| ManifestError::PathNotFound {
                path: path.to_string(),
            })
    }

    /// Resolve several paths, failing on the first one that is absent
    pub fn resolve_many<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<u32>, ManifestError> {
        paths.iter().map(|p| self.resolve(p.as_ref())).collect()
    }

    /// Check that `index` addresses an entry
    pub fn check_index(&self, index: u32) -> Result<(), ManifestError> {
        if (index as usize) < self.entries.len() {
            Ok(())
        } else {
            Err(ManifestError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Render the manifest back to text
    pub fn build(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + 1 + self.entries.len() * 80);
        out.push_str(&self.header);
        out.push('\n');
        for entry in &self.entries {
            let _ = writeln!(out, "{} {}", entry.hash, entry.path);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Split `<hash><whitespace run><path>`
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let split_at = line.find(char::is_whitespace)?;
    let hash = &line[..split_at];
    let path = line[split_at..].trim_start();
    if hash.is_empty() || path.is_empty() {
        return None;
    }
    Some((hash, path))
}
