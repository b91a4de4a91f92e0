//! # Blob Compression
//!
//! Persisted chunk blobs are raw DEFLATE streams (RFC 1951, no zlib
//! envelope) prefixed with their 4-byte little-endian uncompressed size.
//! The prefix lets the loader allocate the output buffer up front and
//! cross-check the inflated length.

use std::io::{Read, Write};

use thiserror::Error;

/// Failures while inflating a persisted blob.
#[derive(Error, Debug)]
pub enum CompressionError {
    /// Blob shorter than the 4-byte size prefix.
    #[error("blob too short for size prefix ({0} bytes)")]
    TruncatedPrefix(usize),

    /// The DEFLATE stream itself is corrupt.
    #[error("deflate stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// The inflated length disagrees with the prefix.
    #[error("uncompressed size mismatch: prefix says {expected}, stream yields {actual}")]
    SizeMismatch {
        /// Length recorded in the prefix.
        expected: usize,
        /// Length actually produced by inflation.
        actual: usize,
    },
}

/// Compresses `data`, prefixing the output with the uncompressed length.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn compress_prepend_size(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len() / 4);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());

    let mut encoder = flate2::write::DeflateEncoder::new(out, flate2::Compression::default());
    // Writing into a Vec cannot fail.
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

/// Inflates a size-prefixed blob produced by [`compress_prepend_size`].
///
/// # Errors
///
/// Returns [`CompressionError`] when the prefix is truncated, the stream is
/// corrupt, or the inflated length mismatches the prefix.
pub fn decompress_size_prepended(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if data.len() < 4 {
        return Err(CompressionError::TruncatedPrefix(data.len()));
    }
    let expected = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

    let mut out = Vec::with_capacity(expected);
    flate2::read::DeflateDecoder::new(&data[4..]).read_to_end(&mut out)?;

    if out.len() != expected {
        return Err(CompressionError::SizeMismatch {
            expected,
            actual: out.len(),
        });
    }
    Ok(out)
}
