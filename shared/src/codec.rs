//! Wire format for server to client datagrams.
//!
//! Every datagram is one frame: a 4-byte big-endian length followed by a
//! zlib-compressed blob of exactly that many bytes. The blob is either the
//! one-byte handshake response or a bincode-encoded [`Payload`].
//! Client to server datagrams are not framed: they carry a single UTF-8
//! encoded command key.

use crate::payload::Payload;
use crate::{HANDSHAKE_RESPONSE, MAX_FRAME_SIZE};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub const LENGTH_PREFIX: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to serialize payload: {0}")]
    Serialize(#[source] bincode::Error),
    #[error("failed to deserialize payload: {0}")]
    Deserialize(#[source] bincode::Error),
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),
    #[error("frame of {0} bytes is shorter than its length prefix")]
    TruncatedFrame(usize),
    #[error("frame declares {declared} bytes but carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("frame of {0} bytes exceeds the size limit")]
    FrameTooLarge(usize),
}

pub fn encode_payload(payload: &Payload) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(payload).map_err(CodecError::Serialize)
}

pub fn decode_payload(bytes: &[u8]) -> Result<Payload, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Deserialize)
}

pub fn compress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::fast());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limit = MAX_FRAME_SIZE as u64 * 16;
    let mut decoded = Vec::new();
    ZlibDecoder::new(data)
        .take(limit + 1)
        .read_to_end(&mut decoded)?;

    if decoded.len() as u64 > limit {
        return Err(CodecError::FrameTooLarge(decoded.len()));
    }
    Ok(decoded)
}

/// Compresses `message` and prepends its length.
pub fn frame(message: &[u8]) -> Result<Vec<u8>, CodecError> {
    let compressed = compress(message)?;
    let total = compressed.len() + LENGTH_PREFIX;
    if total > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(total));
    }
    let declared = u32::try_from(compressed.len()).map_err(|_| CodecError::FrameTooLarge(total))?;

    let mut datagram = Vec::with_capacity(total);
    datagram.extend_from_slice(&declared.to_be_bytes());
    datagram.extend_from_slice(&compressed);
    Ok(datagram)
}

/// Validates the length prefix of a received datagram and decompresses it.
pub fn unframe(datagram: &[u8]) -> Result<Vec<u8>, CodecError> {
    if datagram.len() < LENGTH_PREFIX {
        return Err(CodecError::TruncatedFrame(datagram.len()));
    }

    let (prefix, blob) = datagram.split_at(LENGTH_PREFIX);
    let mut length = [0u8; LENGTH_PREFIX];
    length.copy_from_slice(prefix);
    let declared = u32::from_be_bytes(length) as usize;

    if declared != blob.len() {
        return Err(CodecError::LengthMismatch {
            declared,
            actual: blob.len(),
        });
    }

    decompress(blob)
}

pub fn handshake_frame() -> Result<Vec<u8>, CodecError> {
    frame(&[HANDSHAKE_RESPONSE])
}

pub fn is_handshake_response(message: &[u8]) -> bool {
    message == [HANDSHAKE_RESPONSE]
}
