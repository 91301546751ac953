use sha1::{Digest, Sha1};

/// Length in bytes of a SHA-1 digest.
pub const SHA1_LEN: usize = 20;

/// Length of a SHA-1 digest rendered as hex text.
pub const SHA1_HEX_LEN: usize = SHA1_LEN * 2;

/// SHA-1 of a whole buffer in one shot.
pub fn sha1_digest(bytes: &[u8]) -> [u8; SHA1_LEN] {
    Sha1::digest(bytes).into()
}

/// Lowercase hex rendering of a digest, always [`SHA1_HEX_LEN`] characters.
pub fn sha1_hex(digest: &[u8; SHA1_LEN]) -> String {
    hex::encode(digest)
}
