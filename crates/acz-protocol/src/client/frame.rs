//! Ordered, length-bounded reads of a download response stream

use acz_formats::download::FIELD_SIZE;
use acz_formats::{FileHeader, FrameError, FrameStage, StreamFlags, decode_payload};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Per-response download progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    AwaitingHeader,
    AwaitingPayload,
    Decoding,
    Done,
    Failed,
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingHeader => "awaiting header",
            Self::AwaitingPayload => "awaiting payload",
            Self::Decoding => "decoding",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One decoded blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Manifest index the blob was requested by
    pub index: u32,
    /// Frame header as received
    pub header: FileHeader,
    /// Final, decompressed bytes
    pub data: Vec<u8>,
}

/// Reads the framed download response in strict order
///
/// Every field is read with its exact declared length; a stream that ends
/// early is a [`FrameError::Truncated`], never a short result. Once a read
/// fails the reader is [`DownloadState::Failed`] and must be discarded.
pub struct FrameReader<R> {
    inner: R,
    state: DownloadState,
    flags: Option<StreamFlags>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: DownloadState::Idle,
            flags: None,
        }
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    /// Read all blobs for `indices`, in request order
    pub async fn read_response(&mut self, indices: &[u32]) -> Result<Vec<Blob>, FrameError> {
        let flags = self.read_flags().await?;
        if flags.unknown_bits() != 0 {
            tracing::warn!(?flags, "Download stream has unknown flag bits");
        }

        let mut blobs = Vec::with_capacity(indices.len());
        for (position, &index) in indices.iter().enumerate() {
            blobs.push(self.read_blob(position, index).await?);
        }

        self.transition(DownloadState::Done);
        Ok(blobs)
    }

    /// Read the stream flag word
    pub async fn read_flags(&mut self) -> Result<StreamFlags, FrameError> {
        self.transition(DownloadState::AwaitingHeader);
        let flags = StreamFlags::from_bits(self.read_u32(FrameStage::StreamFlags).await?);
        self.flags = Some(flags);
        Ok(flags)
    }

    /// Read header, payload and decode one blob
    pub async fn read_blob(&mut self, position: usize, index: u32) -> Result<Blob, FrameError> {
        let header = self.read_file_header(position).await?;
        let raw = self.read_payload(position, &header).await?;

        self.transition(DownloadState::Decoding);
        let data = decode_payload(position, &header, raw).inspect_err(|_| self.fail())?;

        tracing::trace!(
            index,
            file_length = header.file_length,
            compressed = header.is_compressed(),
            "Decoded blob"
        );
        Ok(Blob {
            index,
            header,
            data,
        })
    }

    /// Read a per-blob header
    pub async fn read_file_header(&mut self, blob: usize) -> Result<FileHeader, FrameError> {
        self.transition(DownloadState::AwaitingHeader);
        let flags = self.flags.unwrap_or_default();

        let file_length = self.read_u32(FrameStage::FileLength { blob }).await?;
        let compressed_length = if flags.is_pre_compressed() {
            Some(self.read_u32(FrameStage::CompressedLength { blob }).await?)
        } else {
            None
        };

        Ok(FileHeader {
            file_length,
            compressed_length,
        })
    }

    /// Read exactly `header.payload_len()` bytes
    ///
    /// The buffer grows as data arrives rather than trusting the declared
    /// length up front.
    pub async fn read_payload(
        &mut self,
        blob: usize,
        header: &FileHeader,
    ) -> Result<Vec<u8>, FrameError> {
        self.transition(DownloadState::AwaitingPayload);
        let stage = FrameStage::Payload { blob };
        let expected = u64::from(header.payload_len());

        let mut payload = Vec::with_capacity(header.payload_len().min(1 << 20) as usize);
        let read = (&mut self.inner)
            .take(expected)
            .read_to_end(&mut payload)
            .await;

        match read {
            Ok(actual) if actual as u64 == expected => Ok(payload),
            Ok(actual) => Err(self.truncated(stage, expected, actual as u64)),
            Err(source) => Err(self.io_error(stage, source, payload.len() as u64, expected)),
        }
    }

    /// Count and discard anything after the last frame
    pub async fn drain_trailing(&mut self) -> Result<u64, FrameError> {
        tokio::io::copy(&mut self.inner, &mut tokio::io::sink())
            .await
            .map_err(|source| FrameError::Io {
                stage: FrameStage::StreamFlags,
                source,
            })
    }

    async fn read_u32(&mut self, stage: FrameStage) -> Result<u32, FrameError> {
        let mut buf = [0u8; FIELD_SIZE];
        let mut filled = 0;

        while filled < FIELD_SIZE {
            match self.inner.read(&mut buf[filled..]).await {
                Ok(0) => {
                    return Err(self.truncated(stage, FIELD_SIZE as u64, filled as u64));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(self.io_error(stage, source, filled as u64, FIELD_SIZE as u64));
                }
            }
        }

        Ok(u32::from_le_bytes(buf))
    }

    fn truncated(&mut self, stage: FrameStage, expected: u64, actual: u64) -> FrameError {
        self.fail();
        FrameError::Truncated {
            stage,
            expected,
            actual,
        }
    }

    fn io_error(
        &mut self,
        stage: FrameStage,
        source: std::io::Error,
        actual: u64,
        expected: u64,
    ) -> FrameError {
        self.fail();
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            return FrameError::Truncated {
                stage,
                expected,
                actual,
            };
        }
        FrameError::Io { stage, source }
    }

    fn fail(&mut self) {
        self.transition(DownloadState::Failed);
    }

    fn transition(&mut self, next: DownloadState) {
        if self.state != next {
            tracing::trace!(from = %self.state, to = %next, "Download state");
            self.state = next;
        }
    }
}
