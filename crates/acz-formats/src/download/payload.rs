//! Blob payload decoding

use std::io::Read;

use super::error::{FrameError, FrameStage};
use super::header::FileHeader;

/// Turn a received payload into the blob's final bytes
///
/// Compressed payloads are zstd-decompressed. Either way the result must be
/// exactly `file_length` bytes. Decompression stops one byte past the declared
/// length so an oversized blob is reported without decoding all of it.
pub fn decode_payload(blob: usize, header: &FileHeader, raw: Vec<u8>) -> Result<Vec<u8>, FrameError> {
    let expected = u64::from(header.file_length);

    if !header.is_compressed() {
        if raw.len() as u64 != expected {
            return Err(FrameError::LengthMismatch {
                stage: FrameStage::Decode { blob },
                expected,
                actual: raw.len() as u64,
            });
        }
        return Ok(raw);
    }

    let decoder = zstd::stream::read::Decoder::new(raw.as_slice())
        .map_err(|source| FrameError::Decompress { blob, source })?;

    let mut out = Vec::with_capacity(header.file_length.min(1 << 20) as usize);
    decoder
        .take(expected + 1)
        .read_to_end(&mut out)
        .map_err(|source| FrameError::Decompress { blob, source })?;

    if out.len() as u64 != expected {
        return Err(FrameError::LengthMismatch {
            stage: FrameStage::Decode { blob },
            expected,
            actual: out.len() as u64,
        });
    }

    Ok(out)
}
