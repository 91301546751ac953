//! Rendering decoded values as pretty-printed JSON.
//!
//! Objects come out with keys in sorted order and a four space indent.
//! Byte strings become JSON strings, so binary payloads have to be replaced
//! beforehand (see [`crate::bencoding::pieces`]) or rendered lossily.

use crate::bencoding::{Bencode, MAX_DEPTH_LIMIT};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::io;
use thiserror::Error;

/// How byte strings that are not valid UTF-8 are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BytesPolicy {
    /// Fail with [`RenderError::NonUtf8Bytes`].
    #[default]
    Strict,
    /// Replace invalid sequences with U+FFFD.
    Lossy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub bytes: BytesPolicy,
    /// Escape every non-ASCII character as `\uXXXX`.
    pub ascii_only: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            bytes: BytesPolicy::Strict,
            ascii_only: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("byte string at `{path}` is not valid UTF-8")]
    NonUtf8Bytes { path: String },

    #[error("value at `{path}` is nested deeper than {limit}")]
    DepthLimitExceeded { path: String, limit: usize },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

enum Segment<'a> {
    Key(&'a [u8]),
    Index(usize),
}

/// Location inside the tree, only rendered to text when reporting an error.
struct Location<'a>(Vec<Segment<'a>>);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 => write!(f, "{}", String::from_utf8_lossy(k))?,
                Segment::Key(k) => write!(f, ".{}", String::from_utf8_lossy(k))?,
                Segment::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

fn text(bytes: &[u8], location: &Location<'_>, policy: BytesPolicy) -> Result<String, RenderError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) if policy == BytesPolicy::Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Err(_) => Err(RenderError::NonUtf8Bytes {
            path: location.to_string(),
        }),
    }
}

fn convert<'a>(
    value: &'a Bencode,
    location: &mut Location<'a>,
    policy: BytesPolicy,
) -> Result<Value, RenderError> {
    let container = matches!(value, Bencode::List(_) | Bencode::Dict(_));
    if container && location.0.len() >= MAX_DEPTH_LIMIT {
        return Err(RenderError::DepthLimitExceeded {
            path: location.to_string(),
            limit: MAX_DEPTH_LIMIT,
        });
    }

    match value {
        Bencode::Int(i) => Ok(Value::Number(Number::from(*i))),
        Bencode::Bytes(b) => Ok(Value::String(text(b, location, policy)?)),
        Bencode::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                location.0.push(Segment::Index(i));
                array.push(convert(item, location, policy)?);
                location.0.pop();
            }
            Ok(Value::Array(array))
        }
        Bencode::Dict(dict) => {
            // Byte order of keys; a repeated key keeps its last entry.
            let mut map = Map::new();
            for (key, item) in dict.sorted() {
                location.0.push(Segment::Key(key));
                let key = text(key, location, policy)?;
                let item = convert(item, location, policy)?;
                location.0.pop();
                map.insert(key, item);
            }
            Ok(Value::Object(map))
        }
    }
}

/// Converts a decoded tree into a JSON value with sorted object keys.
///
/// Trees nested deeper than [`MAX_DEPTH_LIMIT`] are refused, since both this
/// conversion and the serializer recurse.
pub fn to_json_value(value: &Bencode, options: &RenderOptions) -> Result<Value, RenderError> {
    convert(value, &mut Location(Vec::new()), options.bytes)
}

/// Serializes a JSON value with a four space indent.
pub fn to_json_bytes(value: &Value, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    let formatter = JsonFormatter::new(options.ascii_only);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Renders a decoded tree straight to JSON bytes.
pub fn render(value: &Bencode, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    to_json_bytes(&to_json_value(value, options)?, options)
}

/// Pretty printer that can also escape non-ASCII text.
pub struct JsonFormatter<'a> {
    pretty: PrettyFormatter<'a>,
    ascii_only: bool,
}

impl JsonFormatter<'_> {
    pub fn new(ascii_only: bool) -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"    "),
            ascii_only,
        }
    }
}

impl Formatter for JsonFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ascii_only {
            return writer.write_all(fragment.as_bytes());
        }

        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
