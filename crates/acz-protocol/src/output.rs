//! Persisting downloaded content
//!
//! Output is written beside the destination and renamed into place, so the
//! destination only ever holds a complete file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default output name for a virtual path: its last `/`-separated segment
pub fn default_output_name(file_path: &str) -> &str {
    file_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(file_path)
}

/// Write `bytes` to `dest`, replacing any existing file only on success
pub async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let partial = partial_path(dest);

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(&partial, dest).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }

    tracing::debug!(path = %dest.display(), bytes = bytes.len(), "Wrote output");
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map_or_else(|| OsString::from("download"), ToOwned::to_owned);
    name.push(".part");
    dest.with_file_name(name)
}
