use super::bencode::{Bencode, Dict};
use super::error::{DecodeError, LexError};
use super::tokenizer::{Token, Tokenizer};
use log::trace;

/// Highest nesting any tree may reach.
///
/// Dropping, converting and serializing a tree all recurse, so the decoder
/// never builds anything deeper than this, whatever the options say.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// Nesting limit used by [`decode`].
pub const DEFAULT_MAX_DEPTH: usize = MAX_DEPTH_LIMIT;

/// Settings for the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum number of lists and dictionaries open at the same time,
    /// clamped to [`MAX_DEPTH_LIMIT`].
    pub max_depth: usize,
}

impl DecodeOptions {
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.min(MAX_DEPTH_LIMIT)
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A container whose closing `e` has not been seen yet.
enum Frame {
    List(Vec<Bencode>),
    Dict {
        entries: Dict,
        key: Option<Vec<u8>>,
    },
}

/// Decodes exactly one value spanning the whole of `input`.
pub fn decode(input: &[u8]) -> Result<Bencode, DecodeError> {
    decode_with(input, &DecodeOptions::default())
}

pub fn decode_with(input: &[u8], options: &DecodeOptions) -> Result<Bencode, DecodeError> {
    let mut tokens = Tokenizer::new(input);
    let root = decode_value(&mut tokens, options)?;

    match tokens.next() {
        None => Ok(root),
        Some(Ok((offset, _))) => Err(DecodeError::TrailingData { offset }),
        Some(Err(e)) => Err(DecodeError::TrailingData { offset: e.offset }),
    }
}

/// Pulls tokens until one complete value has been built.
///
/// Containers are kept on an explicit stack, so input nesting never grows the
/// call stack.
pub fn decode_value<'a, I>(tokens: &mut I, options: &DecodeOptions) -> Result<Bencode, DecodeError>
where
    I: Iterator<Item = Result<(usize, Token<'a>), LexError>>,
{
    let max_depth = options.effective_max_depth();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let (offset, token) = tokens.next().ok_or(DecodeError::UnexpectedEndOfInput)??;

        let value = match token {
            Token::Integer(i) => Bencode::Int(i),
            Token::StringMarker => match tokens.next().transpose()? {
                Some((_, Token::Payload(bytes))) => Bencode::Bytes(bytes.to_vec()),
                Some((offset, other)) => {
                    return Err(DecodeError::UnexpectedToken {
                        offset,
                        found: other.describe(),
                    });
                }
                None => return Err(DecodeError::UnexpectedEndOfInput),
            },
            Token::ListStart | Token::DictStart => {
                if stack.len() >= max_depth {
                    return Err(DecodeError::DepthLimitExceeded {
                        limit: max_depth,
                        offset,
                    });
                }
                stack.push(if token == Token::ListStart {
                    Frame::List(Vec::new())
                } else {
                    Frame::Dict {
                        entries: Dict::new(),
                        key: None,
                    }
                });
                continue;
            }
            Token::End => match stack.pop() {
                Some(Frame::List(items)) => Bencode::List(items),
                Some(Frame::Dict { entries, key: None }) => Bencode::Dict(entries),
                Some(Frame::Dict { key: Some(_), .. }) => {
                    return Err(DecodeError::OddDictArity { offset });
                }
                None => {
                    return Err(DecodeError::UnexpectedToken {
                        offset,
                        found: token.describe(),
                    });
                }
            },
            Token::Payload(_) => {
                return Err(DecodeError::UnexpectedToken {
                    offset,
                    found: token.describe(),
                });
            }
        };

        match stack.last_mut() {
            None => {
                trace!("decoded root value, last token at offset {}", offset);
                return Ok(value);
            }
            Some(Frame::List(items)) => items.push(value),
            Some(Frame::Dict { entries, key }) => match key.take() {
                Some(k) => entries.insert(k, value),
                None => match value {
                    Bencode::Bytes(k) => *key = Some(k),
                    _ => return Err(DecodeError::NonStringKey { offset }),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Bencode {
        Bencode::Bytes(s.as_bytes().to_vec())
    }

    #[test]
    fn test_decode_atoms() {
        assert_eq!(decode(b"i42e").unwrap(), Bencode::Int(42));
        assert_eq!(decode(b"i-3e").unwrap(), Bencode::Int(-3));
        assert_eq!(decode(b"4:spam").unwrap(), bytes("spam"));
    }

    #[test]
    fn test_decode_list() {
        assert_eq!(
            decode(b"l4:spam4:eggse").unwrap(),
            Bencode::List(vec![bytes("spam"), bytes("eggs")])
        );
        assert_eq!(decode(b"le").unwrap(), Bencode::List(vec![]));
    }

    #[test]
    fn test_decode_dict() {
        let value = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(b"cow"), Some(&bytes("moo")));
        assert_eq!(dict.get(b"spam"), Some(&bytes("eggs")));
    }

    #[test]
    fn test_decode_nested() {
        let value = decode(b"d4:infod6:lengthi12345eee").unwrap();
        let info = value.get(b"info").unwrap();
        assert_eq!(info.get(b"length"), Some(&Bencode::Int(12345)));
        assert_eq!(info.as_dict().unwrap().len(), 1);
    }

    #[test]
    fn test_dict_keeps_insertion_order() {
        let value = decode(b"d1:bi1e1:ai2ee").unwrap();
        let keys: Vec<&[u8]> = value.as_dict().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"b"[..], &b"a"[..]]);
    }

    #[test]
    fn test_missing_integer_terminator() {
        assert!(matches!(decode(b"i42"), Err(DecodeError::Lex(_))));
    }

    #[test]
    fn test_odd_dict_arity() {
        assert_eq!(
            decode(b"d1:ae"),
            Err(DecodeError::OddDictArity { offset: 4 })
        );
    }

    #[test]
    fn test_trailing_data() {
        assert_eq!(
            decode(b"lex"),
            Err(DecodeError::TrailingData { offset: 2 })
        );
        assert_eq!(
            decode(b"i1ei2e"),
            Err(DecodeError::TrailingData { offset: 3 })
        );
    }

    #[test]
    fn test_unclosed_container() {
        assert_eq!(decode(b"l4:spam"), Err(DecodeError::UnexpectedEndOfInput));
        assert_eq!(decode(b"d"), Err(DecodeError::UnexpectedEndOfInput));
        assert_eq!(decode(b""), Err(DecodeError::UnexpectedEndOfInput));
    }

    #[test]
    fn test_stray_end() {
        assert_eq!(
            decode(b"e"),
            Err(DecodeError::UnexpectedToken {
                offset: 0,
                found: "end marker"
            })
        );
    }

    #[test]
    fn test_non_string_key() {
        assert_eq!(
            decode(b"di1e3:abce"),
            Err(DecodeError::NonStringKey { offset: 1 })
        );
    }

    #[test]
    fn test_depth_limit() {
        let options = DecodeOptions { max_depth: 3 };
        assert!(decode_with(b"llleee", &options).is_ok());
        assert_eq!(
            decode_with(b"lllleeee", &options),
            Err(DecodeError::DepthLimitExceeded {
                limit: 3,
                offset: 3
            })
        );
    }

    fn nested_lists(depth: usize) -> Vec<u8> {
        let mut input = vec![b'l'; depth];
        input.extend(std::iter::repeat(b'e').take(depth));
        input
    }

    #[test]
    fn test_max_depth_is_clamped() {
        let options = DecodeOptions {
            max_depth: MAX_DEPTH_LIMIT * 1000,
        };
        assert_eq!(options.effective_max_depth(), MAX_DEPTH_LIMIT);

        let value = decode_with(&nested_lists(MAX_DEPTH_LIMIT), &options).unwrap();
        drop(value);

        assert_eq!(
            decode_with(&nested_lists(MAX_DEPTH_LIMIT + 1), &options),
            Err(DecodeError::DepthLimitExceeded {
                limit: MAX_DEPTH_LIMIT,
                offset: MAX_DEPTH_LIMIT
            })
        );
    }

    #[test]
    fn test_deep_input_fails_cleanly() {
        let depth = 200_000;
        let options = DecodeOptions {
            max_depth: depth + 1,
        };

        let mut input = vec![b'l'];
        input.extend(nested_lists(depth));
        input.push(b'x');
        assert!(matches!(
            decode_with(&input, &options),
            Err(DecodeError::DepthLimitExceeded { .. })
        ));

        assert!(matches!(
            decode(&nested_lists(depth)),
            Err(DecodeError::DepthLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_decode_value_leaves_rest_of_stream() {
        let mut tokens = Tokenizer::new(b"i1e4:spam");
        let options = DecodeOptions::default();
        assert_eq!(decode_value(&mut tokens, &options).unwrap(), Bencode::Int(1));
        assert_eq!(decode_value(&mut tokens, &options).unwrap(), bytes("spam"));
        assert!(tokens.next().is_none());
    }
}
