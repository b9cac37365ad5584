//! Compression-aware framing for slugs and metadata containers.
//!
//! Payloads only pay for DEFLATE when it actually wins: small inputs pass
//! through untouched, and a compressed frame is used only when it beats the
//! original even after the one-byte marker. The marker byte `0x78` in
//! position 0 is what distinguishes the two shapes on decode, which makes
//! the raw payload's first byte part of the contract: inputs to
//! [`compress_if_smaller`] must never begin with `0x78`, or a passthrough
//! would be misread as a compressed frame. The protobuf messages framed
//! here always lead with a low-numbered field key, never `0x78`.
//!
//! Chunking exists solely for transport: some messenger clients stop
//! linkifying very long unbroken strings, so encoded slugs are split with
//! `*` every 300 characters and the separators are stripped before decode.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

/// Inputs below this many bytes are never compressed.
const COMPRESSION_THRESHOLD: usize = 100;

/// Marker prepended to DEFLATE-compressed frames.
const COMPRESSION_MARKER: u8 = 0x78;

/// Hard cap on inflated output.
const MAX_DECOMPRESSED_LEN: usize = 1024 * 1024;

/// Chunk length for transport-friendly slugs.
const CHUNK_LENGTH: usize = 300;

const CHUNK_SEPARATOR: char = '*';

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("decompressed payload exceeds {MAX_DECOMPRESSED_LEN} bytes")]
    DecompressionBomb,
    #[error("deflate error: {0}")]
    Deflate(#[from] std::io::Error),
}

/// Compress `input` with DEFLATE if the result (plus marker) is strictly
/// smaller, otherwise return the input unchanged.
///
/// The output is at most one byte longer than the input.
///
/// The input must not begin with the `0x78` marker: an input returned
/// unchanged would then be indistinguishable from a compressed frame on
/// decode. Encoded protobuf messages satisfy this by construction.
pub fn compress_if_smaller(input: &[u8]) -> Result<Vec<u8>, FramingError> {
    debug_assert!(
        input.first() != Some(&COMPRESSION_MARKER),
        "raw input must not begin with the compression marker"
    );
    if input.len() < COMPRESSION_THRESHOLD {
        return Ok(input.to_vec());
    }

    let mut encoder = DeflateEncoder::new(
        Vec::with_capacity(input.len() / 2),
        Compression::default(),
    );
    encoder.write_all(input)?;
    let compressed = encoder.finish()?;

    if compressed.len() + 1 < input.len() {
        let mut framed = Vec::with_capacity(compressed.len() + 1);
        framed.push(COMPRESSION_MARKER);
        framed.extend_from_slice(&compressed);
        Ok(framed)
    } else {
        Ok(input.to_vec())
    }
}

/// Invert [`compress_if_smaller`] for inputs satisfying its precondition.
///
/// A frame beginning with the `0x78` marker is inflated; anything else is
/// returned unchanged.
///
/// # Errors
/// Fails with [`FramingError::DecompressionBomb`] before exposing any
/// buffer larger than 1 MiB.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, FramingError> {
    match input.first() {
        Some(&COMPRESSION_MARKER) => {
            let mut out = Vec::new();
            let mut decoder = DeflateDecoder::new(&input[1..]).take(MAX_DECOMPRESSED_LEN as u64 + 1);
            decoder.read_to_end(&mut out)?;
            if out.len() > MAX_DECOMPRESSED_LEN {
                return Err(FramingError::DecompressionBomb);
            }
            Ok(out)
        }
        _ => Ok(input.to_vec()),
    }
}

/// Insert a `*` separator every 300 characters.
pub fn chunk_for_transport(encoded: &str) -> String {
    let chars: Vec<char> = encoded.chars().collect();
    chars
        .chunks(CHUNK_LENGTH)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(&CHUNK_SEPARATOR.to_string())
}

/// Strip every `*` separator inserted by [`chunk_for_transport`].
pub fn strip_transport_chunks(encoded: &str) -> String {
    encoded.chars().filter(|c| *c != CHUNK_SEPARATOR).collect()
}
