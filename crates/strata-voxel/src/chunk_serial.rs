//! Binary record format for persisting a [`Chunk`].
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic bytes `[0x53, 0x54, 0x56, 0x43]` ("STVC") |
//! | 4 | 1 | Format version (`u8`, currently 1) |
//! | 5 | 1 | Buffer mode (0 air, 1 unlit, 2 lit) |
//! | 6 | 1 | Flags (bit 0: payload is LZ4 with prepended size) |
//! | 7 | M | Raw voxel bytes, possibly compressed |
//!
//! Air chunks carry no payload. The `modified` flag is not persisted; a
//! decoded chunk always starts clean.

use lz4_flex::block::decompress_into;
use lz4_flex::compress_prepend_size;

use crate::buffer::{VoxelBuffer, VoxelMode};
use crate::chunk::{CHUNK_VOLUME, Chunk};

/// Magic bytes identifying the STVC format.
const MAGIC: [u8; 4] = [0x53, 0x54, 0x56, 0x43];

/// Current format version.
const FORMAT_VERSION: u8 = 1;

/// Flag bit: payload is LZ4-compressed.
const FLAG_LZ4: u8 = 0x01;

const HEADER_LEN: usize = 7;

/// Length of the little-endian size prefix on compressed payloads.
const SIZE_PREFIX_LEN: usize = 4;

/// Errors that can occur during chunk deserialization.
#[derive(Debug, thiserror::Error)]
pub enum ChunkSerError {
    /// The data does not start with the expected magic bytes.
    #[error("invalid magic bytes")]
    InvalidMagic,
    /// The format version is not supported by this build.
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),
    /// The mode byte is not a known buffer mode.
    #[error("invalid buffer mode: {0}")]
    InvalidMode(u8),
    /// The data is shorter than expected.
    #[error("data truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count received.
        actual: usize,
    },
    /// A compressed payload declares a size other than its mode's buffer size.
    #[error("compressed payload declares {declared} bytes, mode needs {expected}")]
    SizeMismatch {
        /// Buffer size for the record's mode.
        expected: usize,
        /// Size from the payload's prefix.
        declared: usize,
    },
    /// The LZ4 payload could not be decompressed.
    #[error("decompression failed: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),
}

impl Chunk {
    /// Serializes this chunk's buffer into an STVC record.
    pub fn serialize(&self, compress: bool) -> Vec<u8> {
        let raw = self.buffer().as_bytes();
        let compress = compress && !raw.is_empty();
        let payload = if compress {
            compress_prepend_size(raw)
        } else {
            raw.to_vec()
        };

        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(&MAGIC);
        buf.push(FORMAT_VERSION);
        buf.push(self.mode() as u8);
        buf.push(if compress { FLAG_LZ4 } else { 0 });
        buf.extend_from_slice(&payload);
        buf
    }

    /// Deserializes an STVC record.
    pub fn deserialize(data: &[u8]) -> Result<Self, ChunkSerError> {
        if data.len() < MAGIC.len() || data[..4] != MAGIC {
            return Err(ChunkSerError::InvalidMagic);
        }
        if data.len() < HEADER_LEN {
            return Err(ChunkSerError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        let version = data[4];
        if version != FORMAT_VERSION {
            return Err(ChunkSerError::UnsupportedVersion(version));
        }
        let mode = VoxelMode::from_u8(data[5]).ok_or(ChunkSerError::InvalidMode(data[5]))?;
        let flags = data[6];

        let expected = CHUNK_VOLUME * mode.bytes_per_voxel();
        let payload = &data[HEADER_LEN..];
        let raw = if flags & FLAG_LZ4 != 0 {
            decompress_payload(payload, expected)?
        } else {
            payload.to_vec()
        };

        let actual = raw.len();
        let buffer = VoxelBuffer::from_raw(mode, raw)
            .ok_or(ChunkSerError::Truncated { expected, actual })?;
        Ok(Chunk::from_buffer(buffer))
    }
}

/// Decompresses a size-prefixed LZ4 payload into exactly `expected` bytes.
///
/// The prefix must match `expected`, so a corrupt record never sizes the
/// output buffer.
fn decompress_payload(payload: &[u8], expected: usize) -> Result<Vec<u8>, ChunkSerError> {
    let Some((prefix, block)) = payload.split_first_chunk::<SIZE_PREFIX_LEN>() else {
        return Err(ChunkSerError::Truncated {
            expected: SIZE_PREFIX_LEN,
            actual: payload.len(),
        });
    };
    let declared = u32::from_le_bytes(*prefix) as usize;
    if declared != expected {
        return Err(ChunkSerError::SizeMismatch { expected, declared });
    }

    let mut raw = vec![0; expected];
    let written = decompress_into(block, &mut raw)?;
    if written != expected {
        return Err(ChunkSerError::Truncated {
            expected,
            actual: written,
        });
    }
    Ok(raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
