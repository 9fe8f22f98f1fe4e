//! # Download frames
//!
//! A download request is a `POST` whose body lists blob indices, each a
//! little-endian `u32`. The response is read strictly in order:
//!
//! ```text
//! u32 flags                        once per response
//! repeat for each requested index:
//!   u32 file_length                decompressed size
//!   u32 compressed_length          only if flags & PRE_COMPRESSED; 0 = sent raw
//!   [u8; payload_len]              compressed_length if nonzero, else file_length
//! ```
//!
//! All integers are little-endian. This module describes the frame fields and
//! decodes payloads; reading them from a stream is the client's job.
//!
//! ```
//! use acz_formats::download::{DownloadResponseBuilder, StreamFlags, encode_request};
//!
//! assert_eq!(encode_request(&[3]).as_ref(), &[3, 0, 0, 0]);
//!
//! let mut response = DownloadResponseBuilder::new(StreamFlags::NONE);
//! response.push_blob(b"hello").expect("Test operation should succeed");
//! assert_eq!(response.build().len(), 4 + 4 + 5);
//! ```

mod error;
mod header;
mod payload;
mod response;

pub use error::{FrameError, FrameStage};
pub use header::{FIELD_SIZE, FileHeader, StreamFlags, encode_request};
pub use payload::decode_payload;
pub use response::{DEFAULT_SAVE_THRESHOLD, DownloadResponseBuilder};

/// Request header carrying the download protocol version
pub const PROTOCOL_HEADER: &str = "X-Robust-Download-Protocol";

/// `OPTIONS` response header with the lowest supported protocol version
pub const MIN_PROTOCOL_HEADER: &str = "X-Robust-Download-Min-Protocol";

/// `OPTIONS` response header with the highest supported protocol version
pub const MAX_PROTOCOL_HEADER: &str = "X-Robust-Download-Max-Protocol";

/// Protocol version implemented here
pub const PROTOCOL_VERSION: u32 = 1;
