use thiserror::Error;

/// Failure to recognise a token at some offset of the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexical error at offset {offset}: {kind}")]
pub struct LexError {
    pub offset: usize,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected byte {0:#04x}")]
    UnexpectedByte(u8),

    #[error("unterminated integer")]
    UnterminatedInteger,

    #[error("invalid integer literal {0:?}")]
    InvalidInteger(String),

    #[error("invalid string length prefix")]
    InvalidLength,

    #[error("string of length {declared} overruns input ({available} bytes left)")]
    StringOverrun { declared: usize, available: usize },
}

/// Structural failure while building a value tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { offset: usize, found: &'static str },

    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("dictionary closed after a key with no value at offset {offset}")]
    OddDictArity { offset: usize },

    #[error("dictionary key at offset {offset} is not a byte string")]
    NonStringKey { offset: usize },

    #[error("trailing data at offset {offset}")]
    TrailingData { offset: usize },

    #[error("nesting deeper than {limit} at offset {offset}")]
    DepthLimitExceeded { limit: usize, offset: usize },
}
