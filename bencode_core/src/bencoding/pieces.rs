//! Replacing the binary `pieces` payload of a metainfo buffer with its digest.
//!
//! The piece hashes are raw SHA-1 output and rarely valid text. Before the
//! buffer is decoded for display, the payload is swapped for the lowercase hex
//! SHA-1 of the whole payload, and its length prefix is rewritten to `40:`.
//! The transform is lossy: the individual piece hashes cannot be recovered.

use super::digest::{SHA1_HEX_LEN, SHA1_LEN, sha1_digest, sha1_hex};
use log::{debug, warn};
use std::ops::Range;
use thiserror::Error;

/// The literal key whose value gets substituted.
pub const PIECES_KEY: &[u8] = b"pieces";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PiecesError {
    /// The buffer does not contain `pieces` anywhere, so it is not a metainfo file.
    #[error("no `pieces` key found, not a metainfo file")]
    MissingPiecesKey,

    #[error("malformed length prefix after `pieces` at offset {offset}")]
    MalformedLength { offset: usize },

    #[error("`pieces` payload of {declared} bytes at offset {offset} overruns input ({available} bytes left)")]
    PayloadOverrun {
        offset: usize,
        declared: usize,
        available: usize,
    },
}

/// What was replaced, in offsets of the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiecesSubstitution {
    /// Offset of the first `pieces` occurrence.
    pub key_offset: usize,
    /// Length declared by the original prefix.
    pub declared_len: usize,
    /// Span of the original payload bytes.
    pub payload: Range<usize>,
    pub digest: [u8; SHA1_LEN],
    pub digest_hex: String,
}

impl PiecesSubstitution {
    /// Number of complete 20-byte piece hashes in the original payload.
    pub fn piece_count(&self) -> usize {
        self.declared_len / SHA1_LEN
    }

    pub fn is_whole_pieces(&self) -> bool {
        self.declared_len % SHA1_LEN == 0
    }
}

/// A buffer ready for the tokenizer, with the record of the substitution.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub buffer: Vec<u8>,
    pub substitution: PiecesSubstitution,
}

/// Swaps the payload of the first `pieces` occurrence for its hex SHA-1 digest.
///
/// Only the first occurrence of the bytes `pieces` is considered, wherever it
/// appears. A buffer with those bytes inside an earlier string (an announce
/// URL, say) is rewritten at the wrong place and will normally fail to decode.
///
/// # Arguments
/// * `input` - The raw bytes of a metainfo file.
///
/// # Returns
/// The rewritten buffer and the substitution record, or a [`PiecesError`]
/// when no usable `pieces` value can be located.
pub fn substitute_pieces(input: &[u8]) -> Result<Preprocessed, PiecesError> {
    let key_offset = input
        .windows(PIECES_KEY.len())
        .position(|window| window == PIECES_KEY)
        .ok_or(PiecesError::MissingPiecesKey)?;

    let prefix_start = key_offset + PIECES_KEY.len();
    let mut colon = prefix_start;
    while colon < input.len() && input[colon].is_ascii_digit() {
        colon += 1;
    }
    if colon == prefix_start || input.get(colon) != Some(&b':') {
        return Err(PiecesError::MalformedLength {
            offset: prefix_start,
        });
    }

    let declared_len = std::str::from_utf8(&input[prefix_start..colon])
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or(PiecesError::MalformedLength {
            offset: prefix_start,
        })?;

    let payload_start = colon + 1;
    let available = input.len() - payload_start;
    if declared_len > available {
        return Err(PiecesError::PayloadOverrun {
            offset: payload_start,
            declared: declared_len,
            available,
        });
    }
    let payload = payload_start..payload_start + declared_len;

    let digest = sha1_digest(&input[payload.clone()]);
    let digest_hex = sha1_hex(&digest);

    let prefix = format!("{}:", SHA1_HEX_LEN);
    let mut buffer = Vec::with_capacity(
        prefix_start + prefix.len() + SHA1_HEX_LEN + (input.len() - payload.end),
    );
    buffer.extend_from_slice(&input[..prefix_start]);
    buffer.extend_from_slice(prefix.as_bytes());
    buffer.extend_from_slice(digest_hex.as_bytes());
    buffer.extend_from_slice(&input[payload.end..]);

    let substitution = PiecesSubstitution {
        key_offset,
        declared_len,
        payload,
        digest,
        digest_hex,
    };

    debug!(
        "replaced {} bytes of `pieces` at offset {} with digest {}",
        declared_len, key_offset, substitution.digest_hex
    );
    if !substitution.is_whole_pieces() {
        warn!(
            "`pieces` length {} is not a multiple of {}",
            declared_len, SHA1_LEN
        );
    }

    Ok(Preprocessed {
        buffer,
        substitution,
    })
}
