//! Download request encoding and response frame headers

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Size in bytes of every integer field on the wire
pub const FIELD_SIZE: usize = 4;

/// Flag word sent once at the start of a download response
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StreamFlags(u32);

impl StreamFlags {
    /// No flags set
    pub const NONE: Self = Self(0);

    /// Blobs may be individually zstd-compressed; every file header carries a
    /// compressed length
    pub const PRE_COMPRESSED: Self = Self(1);

    /// Wrap a raw flag word
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Parse the little-endian wire form
    pub const fn from_le_bytes(bytes: [u8; FIELD_SIZE]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Raw flag word
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether per-blob compression is enabled for the session
    pub const fn is_pre_compressed(self) -> bool {
        self.contains(Self::PRE_COMPRESSED)
    }

    /// Bits this client does not understand
    pub const fn unknown_bits(self) -> u32 {
        self.0 & !Self::PRE_COMPRESSED.0
    }

    /// Size of each file header under these flags
    pub const fn file_header_len(self) -> usize {
        if self.is_pre_compressed() {
            FIELD_SIZE * 2
        } else {
            FIELD_SIZE
        }
    }
}

impl fmt::Debug for StreamFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamFlags({:#x}", self.0)?;
        if self.is_pre_compressed() {
            write!(f, " PRE_COMPRESSED")?;
        }
        write!(f, ")")
    }
}

/// Header preceding each blob in a download response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Size of the blob once decompressed
    pub file_length: u32,
    /// Size of the blob on the wire; `None` when the stream is not
    /// pre-compressed, `Some(0)` when this blob was sent uncompressed anyway
    pub compressed_length: Option<u32>,
}

impl FileHeader {
    /// Header for a blob sent as-is
    pub const fn uncompressed(file_length: u32) -> Self {
        Self {
            file_length,
            compressed_length: None,
        }
    }

    /// Whether the payload must be decompressed
    pub const fn is_compressed(&self) -> bool {
        matches!(self.compressed_length, Some(n) if n != 0)
    }

    /// Number of payload bytes following this header on the wire
    pub const fn payload_len(&self) -> u32 {
        match self.compressed_length {
            Some(n) if n != 0 => n,
            _ => self.file_length,
        }
    }

    /// Append the wire form of this header
    ///
    /// The compressed length is written whenever the stream is pre-compressed,
    /// as 0 if the header has none.
    pub fn write_to(&self, flags: StreamFlags, out: &mut BytesMut) {
        out.put_u32_le(self.file_length);
        if flags.is_pre_compressed() {
            out.put_u32_le(self.compressed_length.unwrap_or(0));
        }
    }
}

/// Encode a download request body: one little-endian `u32` per index
pub fn encode_request(indices: &[u32]) -> Bytes {
    let mut body = BytesMut::with_capacity(indices.len() * FIELD_SIZE);
    for &index in indices {
        body.put_u32_le(index);
    }
    body.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_index_request() {
        assert_eq!(encode_request(&[1]).as_ref(), &[1, 0, 0, 0]);
        assert_eq!(
            encode_request(&[0x0102_0304]).as_ref(),
            &[0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_batch_request() {
        assert_eq!(
            encode_request(&[0, 258]).as_ref(),
            &[0, 0, 0, 0, 2, 1, 0, 0]
        );
        assert!(encode_request(&[]).is_empty());
    }

    #[test]
    fn test_flags() {
        let flags = StreamFlags::from_le_bytes([1, 0, 0, 0]);
        assert!(flags.is_pre_compressed());
        assert_eq!(flags.unknown_bits(), 0);
        assert_eq!(flags.file_header_len(), 8);

        let flags = StreamFlags::from_bits(0b110);
        assert!(!flags.is_pre_compressed());
        assert_eq!(flags.unknown_bits(), 0b110);
        assert_eq!(flags.file_header_len(), 4);
    }

    #[test]
    fn test_payload_len_selection() {
        assert_eq!(FileHeader::uncompressed(5).payload_len(), 5);

        let unused = FileHeader {
            file_length: 5,
            compressed_length: Some(0),
        };
        assert!(!unused.is_compressed());
        assert_eq!(unused.payload_len(), 5);

        let compressed = FileHeader {
            file_length: 11,
            compressed_length: Some(7),
        };
        assert!(compressed.is_compressed());
        assert_eq!(compressed.payload_len(), 7);
    }

    #[test]
    fn test_write_header() {
        let mut out = BytesMut::new();
        FileHeader::uncompressed(5).write_to(StreamFlags::PRE_COMPRESSED, &mut out);
        assert_eq!(out.as_ref(), &[5, 0, 0, 0, 0, 0, 0, 0]);

        let mut out = BytesMut::new();
        FileHeader::uncompressed(5).write_to(StreamFlags::NONE, &mut out);
        assert_eq!(out.as_ref(), &[5, 0, 0, 0]);
    }
}
