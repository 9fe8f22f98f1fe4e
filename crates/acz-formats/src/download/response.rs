//! Download response builder
//!
//! Produces response bodies the way a Robust server lays them out. Used to
//! serve content from test servers and fixtures.

use bytes::{BufMut, Bytes, BytesMut};

use super::header::{FileHeader, StreamFlags};

/// Compressed blobs must save at least this many bytes to be sent compressed
pub const DEFAULT_SAVE_THRESHOLD: usize = 14;

/// Builder for a framed download response
#[derive(Debug, Clone)]
pub struct DownloadResponseBuilder {
    flags: StreamFlags,
    level: i32,
    save_threshold: usize,
    body: BytesMut,
}

impl DownloadResponseBuilder {
    /// Start a response with the given stream flags
    pub fn new(flags: StreamFlags) -> Self {
        let mut body = BytesMut::new();
        body.put_u32_le(flags.bits());
        Self {
            flags,
            level: zstd::DEFAULT_COMPRESSION_LEVEL,
            save_threshold: DEFAULT_SAVE_THRESHOLD,
            body,
        }
    }

    /// zstd level used by [`Self::push_blob`]
    pub fn compression_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Minimum saving for a blob to be sent compressed
    pub fn save_threshold(mut self, threshold: usize) -> Self {
        self.save_threshold = threshold;
        self
    }

    /// Append a blob, compressing it when the stream is pre-compressed and
    /// compression saves enough
    pub fn push_blob(&mut self, data: &[u8]) -> std::io::Result<&mut Self> {
        let file_length = u32::try_from(data.len())
            .map_err(|_| std::io::Error::other("blob larger than u32::MAX"))?;

        if self.flags.is_pre_compressed() {
            let packed = zstd::encode_all(data, self.level)?;
            if packed.len() + self.save_threshold < data.len() {
                let header = FileHeader {
                    file_length,
                    compressed_length: Some(packed.len() as u32),
                };
                return Ok(self.push_raw(header, &packed));
            }
        }

        Ok(self.push_raw(FileHeader::uncompressed(file_length), data))
    }

    /// Append a header and payload verbatim, without checking they agree
    pub fn push_raw(&mut self, header: FileHeader, payload: &[u8]) -> &mut Self {
        header.write_to(self.flags, &mut self.body);
        self.body.put_slice(payload);
        self
    }

    /// Finish the response body
    pub fn build(self) -> Bytes {
        self.body.freeze()
    }
}
