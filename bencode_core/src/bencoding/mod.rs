pub mod bencode;
pub mod decoder;
pub mod digest;
pub mod error;
pub mod pieces;
pub mod tokenizer;

pub use bencode::{Bencode, Dict};
pub use decoder::{
    DEFAULT_MAX_DEPTH, DecodeOptions, MAX_DEPTH_LIMIT, decode, decode_value, decode_with,
};
pub use digest::{sha1_digest, sha1_hex};
pub use error::{DecodeError, LexError, LexErrorKind};
pub use pieces::{PiecesError, PiecesSubstitution, Preprocessed, substitute_pieces};
pub use tokenizer::{Token, Tokenizer};
