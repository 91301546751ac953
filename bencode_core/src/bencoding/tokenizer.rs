//! Lexer turning a bencoded buffer into a forward-only stream of tokens.

use super::error::{LexError, LexErrorKind};

/// A lexical unit of bencode.
///
/// A byte string is emitted as two tokens: a [`Token::StringMarker`]
/// immediately followed by its [`Token::Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Integer(i64),
    StringMarker,
    Payload(&'a [u8]),
    ListStart,
    DictStart,
    End,
}

impl Token<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Integer(_) => "integer",
            Token::StringMarker => "string",
            Token::Payload(_) => "string payload",
            Token::ListStart => "list start",
            Token::DictStart => "dictionary start",
            Token::End => "end marker",
        }
    }
}

/// Iterator over `(offset, token)` pairs of a buffer.
///
/// Payload bytes are skipped over, never scanned for tokens. The first
/// lexical error ends the stream.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    pending: Option<(usize, &'a [u8])>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_offset(input, 0)
    }

    pub fn with_offset(input: &'a [u8], offset: usize) -> Self {
        Self {
            input,
            pos: offset,
            pending: None,
            done: false,
        }
    }

    /// Offset of the next byte to be scanned.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn error(&self, offset: usize, kind: LexErrorKind) -> LexError {
        LexError { offset, kind }
    }

    fn scan_digits(&self, from: usize) -> usize {
        let mut end = from;
        while end < self.input.len() && self.input[end].is_ascii_digit() {
            end += 1;
        }
        end
    }

    fn lex_integer(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.pos;
        let mut cursor = start + 1;
        if cursor < self.input.len() && self.input[cursor] == b'-' {
            cursor += 1;
        }
        let end = self.scan_digits(cursor);

        match self.input.get(end) {
            Some(b'e') => {}
            Some(_) => {
                let literal = String::from_utf8_lossy(&self.input[start + 1..=end]).into_owned();
                return Err(self.error(start, LexErrorKind::InvalidInteger(literal)));
            }
            None => return Err(self.error(start, LexErrorKind::UnterminatedInteger)),
        }

        let digits = &self.input[cursor..end];
        let literal = &self.input[start + 1..end];
        let negative = cursor != start + 1;
        let leading_zero = digits.len() > 1 && digits[0] == b'0';
        let negative_zero = negative && digits == b"0";
        if digits.is_empty() || leading_zero || negative_zero {
            let literal = String::from_utf8_lossy(literal).into_owned();
            return Err(self.error(start, LexErrorKind::InvalidInteger(literal)));
        }

        // Only ASCII digits and an optional sign are left in the literal.
        let text = std::str::from_utf8(literal).unwrap_or_default();
        let value = text
            .parse::<i64>()
            .map_err(|_| self.error(start, LexErrorKind::InvalidInteger(text.to_string())))?;

        self.pos = end + 1;
        Ok(Token::Integer(value))
    }

    fn lex_string(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.pos;
        let colon = self.scan_digits(start);
        if self.input.get(colon) != Some(&b':') {
            return Err(self.error(start, LexErrorKind::InvalidLength));
        }

        let len = std::str::from_utf8(&self.input[start..colon])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| self.error(start, LexErrorKind::InvalidLength))?;

        let payload_start = colon + 1;
        let available = self.input.len() - payload_start;
        if len > available {
            return Err(self.error(
                start,
                LexErrorKind::StringOverrun {
                    declared: len,
                    available,
                },
            ));
        }

        let payload = &self.input[payload_start..payload_start + len];
        self.pending = Some((payload_start, payload));
        self.pos = payload_start + len;
        Ok(Token::StringMarker)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<(usize, Token<'a>), LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some((offset, payload)) = self.pending.take() {
            return Some(Ok((offset, Token::Payload(payload))));
        }
        if self.pos >= self.input.len() {
            self.done = true;
            return None;
        }

        let offset = self.pos;
        let result = match self.input[offset] {
            b'i' => self.lex_integer(),
            b'l' => {
                self.pos += 1;
                Ok(Token::ListStart)
            }
            b'd' => {
                self.pos += 1;
                Ok(Token::DictStart)
            }
            b'e' => {
                self.pos += 1;
                Ok(Token::End)
            }
            b'0'..=b'9' => self.lex_string(),
            c => Err(self.error(offset, LexErrorKind::UnexpectedByte(c))),
        };

        match result {
            Ok(token) => Some(Ok((offset, token))),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
