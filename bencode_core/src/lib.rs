//! Core library for torrent2json.
//!
//! This library decodes bencoded data into a [`Bencode`] tree and renders
//! `.torrent` metainfo files as pretty JSON, with the binary `pieces` payload
//! replaced by its SHA-1 fingerprint.

pub mod bencoding;
pub mod json;

use bencoding::{
    Bencode, DecodeError, DecodeOptions, PiecesError, PiecesSubstitution, decode_with,
    substitute_pieces,
};
pub use json::{BytesPolicy, RenderError, RenderOptions};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension a metainfo path must carry.
pub const TORRENT_EXTENSION: &str = "torrent";

/// Problems with the input path itself.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("`{}` is not a .torrent file", .path.display())]
    NotTorrent { path: PathBuf },

    #[error("`{}` does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read `{}`: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum TorrentError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("unsupported file shape: {0}")]
    Pieces(#[from] PiecesError),

    #[error("invalid bencode: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A decoded metainfo file.
#[derive(Debug)]
pub struct DecodedTorrent {
    /// The root value, with `pieces` holding the hex digest of the original payload.
    pub root: Bencode,
    pub substitution: PiecesSubstitution,
}

/// Reads a `.torrent` file from the disk.
///
/// # Arguments
///
/// * `path` - The path to the torrent file. It must end in `.torrent` and exist.
pub fn read_torrent(path: &Path) -> Result<Vec<u8>, PathError> {
    if path.extension().and_then(|e| e.to_str()) != Some(TORRENT_EXTENSION) {
        return Err(PathError::NotTorrent {
            path: path.to_path_buf(),
        });
    }
    if !path.exists() {
        return Err(PathError::NotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read(path).map_err(|source| PathError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes a metainfo file from a byte slice.
///
/// # Arguments
///
/// * `buf` - The raw bytes of the torrent file.
/// * `options` - Decoder settings.
pub fn decode_torrent_bytes(
    buf: &[u8],
    options: &DecodeOptions,
) -> Result<DecodedTorrent, TorrentError> {
    let preprocessed = substitute_pieces(buf)?;
    let root = decode_with(&preprocessed.buffer, options)?;
    debug!(
        "decoded {} bytes ({} after substitution)",
        buf.len(),
        preprocessed.buffer.len()
    );

    Ok(DecodedTorrent {
        root,
        substitution: preprocessed.substitution,
    })
}

/// Decodes a metainfo file and renders it as pretty JSON.
pub fn torrent_to_json(
    buf: &[u8],
    decode_options: &DecodeOptions,
    render_options: &RenderOptions,
) -> Result<Vec<u8>, TorrentError> {
    let torrent = decode_torrent_bytes(buf, decode_options)?;
    Ok(json::render(&torrent.root, render_options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencoding::{LexErrorKind, sha1_digest};

    fn create_dummy_torrent(pieces: &[u8]) -> Vec<u8> {
        let mut t = format!(
            "d8:announce13:http://x.com/4:infod6:lengthi10e4:name4:test6:pieces{}:",
            pieces.len()
        )
        .into_bytes();
        t.extend_from_slice(pieces);
        t.extend_from_slice(b"ee");
        t
    }

    fn raw_pieces() -> Vec<u8> {
        vec![
            0x00, 0xff, 0x10, 0x80, 0xc3, 0x28, 0x7b, 0x22, 0x5c, 0x0a, 0xfe, 0x01, 0xe2, 0x82,
            0x65, 0x3a, 0x69, 0x6c, 0x64, 0x9f,
        ]
    }

    #[test]
    fn test_decode_simple_torrent() {
        let raw = raw_pieces();
        let t = decode_torrent_bytes(&create_dummy_torrent(&raw), &DecodeOptions::default())
            .expect("Should decode");

        let info = t.root.get(b"info").expect("Should have info");
        assert_eq!(
            t.root.get(b"announce").and_then(Bencode::as_str),
            Some("http://x.com/")
        );
        assert_eq!(info.get(b"length").and_then(Bencode::as_int), Some(10));
        assert_eq!(info.get(b"name").and_then(Bencode::as_str), Some("test"));
        assert_eq!(
            info.get(b"pieces").and_then(Bencode::as_str),
            Some(hex::encode(sha1_digest(&raw)).as_str())
        );
        assert_eq!(t.substitution.piece_count(), 1);
    }

    #[test]
    fn test_torrent_to_json() {
        let raw = raw_pieces();
        let out = torrent_to_json(
            &create_dummy_torrent(&raw),
            &DecodeOptions::default(),
            &RenderOptions::default(),
        )
        .expect("Should render");

        let expected = format!(
            concat!(
                "{{\n",
                "    \"announce\": \"http://x.com/\",\n",
                "    \"info\": {{\n",
                "        \"length\": 10,\n",
                "        \"name\": \"test\",\n",
                "        \"pieces\": \"{}\"\n",
                "    }}\n",
                "}}"
            ),
            hex::encode(sha1_digest(&raw))
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_missing_pieces_is_reported_separately() {
        let res = decode_torrent_bytes(b"d4:name4:teste", &DecodeOptions::default());
        assert!(matches!(
            res,
            Err(TorrentError::Pieces(PiecesError::MissingPiecesKey))
        ));
    }

    #[test]
    fn test_invalid_bencode_around_pieces() {
        let mut buf = create_dummy_torrent(&raw_pieces());
        buf.push(b'x');
        let res = decode_torrent_bytes(&buf, &DecodeOptions::default());
        assert!(matches!(
            res,
            Err(TorrentError::Decode(DecodeError::TrailingData { .. }))
        ));

        let res = decode_torrent_bytes(b"d6:pieces0:i1", &DecodeOptions::default());
        match res {
            Err(TorrentError::Decode(DecodeError::Lex(e))) => {
                assert_eq!(e.kind, LexErrorKind::UnterminatedInteger)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_deeply_nested_torrent_is_an_error() {
        let depth = 100_000;
        let mut buf = b"d6:pieces0:1:l".to_vec();
        buf.extend(std::iter::repeat(b'l').take(depth));
        buf.extend(std::iter::repeat(b'e').take(depth + 1));

        let options = DecodeOptions {
            max_depth: depth + 1,
        };
        let res = torrent_to_json(&buf, &options, &RenderOptions::default());
        assert!(matches!(
            res,
            Err(TorrentError::Decode(DecodeError::DepthLimitExceeded {
                limit: bencoding::MAX_DEPTH_LIMIT,
                ..
            }))
        ));
    }

    #[test]
    fn test_read_torrent_rejects_bad_paths() {
        let dir = tempfile::tempdir().unwrap();

        let wrong_ext = dir.path().join("file.txt");
        std::fs::write(&wrong_ext, b"d6:pieces0:e").unwrap();
        assert!(matches!(
            read_torrent(&wrong_ext),
            Err(PathError::NotTorrent { .. })
        ));

        let missing = dir.path().join("missing.torrent");
        assert!(matches!(
            read_torrent(&missing),
            Err(PathError::NotFound { .. })
        ));

        let dir_named_torrent = dir.path().join("folder.torrent");
        std::fs::create_dir(&dir_named_torrent).unwrap();
        assert!(matches!(
            read_torrent(&dir_named_torrent),
            Err(PathError::Unreadable { .. })
        ));

        let good = dir.path().join("good.torrent");
        std::fs::write(&good, b"d6:pieces0:e").unwrap();
        assert_eq!(read_torrent(&good).unwrap(), b"d6:pieces0:e");
    }
}
