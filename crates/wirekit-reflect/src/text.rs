//! The text codec: a bracketed, whitespace-separated record format.
//!
//! ```text
//! [ 10 20 { "The First User" "Some Second User" "Operator" } ]
//! ```
//!
//! Structures are wrapped in `[ ]`, collections in `{ }`, strings are
//! double-quoted with `\` escaping `"` and `\`, and every other scalar is a
//! bare token. Line breaks inside strings are written as `\n` and `\r`, so
//! a record never spans more than one line. Each emitted token is followed by exactly one space, so
//! records always end in `"] "`. Any amount of whitespace is accepted when
//! parsing.
//!
//! Parsing is strict: a member that is missing, an extra member before the
//! closing `]`, or a token of the wrong type are all errors.

use std::any::Any;
use std::str::FromStr;

use crate::collection::CollectionAdapter;
use crate::descriptor::{Reflect, TypeDescriptor};
use crate::error::{ParseError, ParseErrorKind};
use crate::CodecError;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Renders `value` as one text record.
pub fn to_text<T: Reflect>(value: &T) -> Result<String, CodecError> {
    let mut out = String::new();
    T::descriptor().access().write_text(value, &mut out)?;
    Ok(out)
}

/// Parses exactly one record from `input`. Only whitespace may follow it.
pub fn from_text<T: Reflect>(input: &str) -> Result<T, CodecError> {
    let mut value = T::default();
    let consumed = read_text(&mut value, input)?;
    let mut rest = TextReader {
        input,
        pos: consumed,
    };
    rest.skip_whitespace();
    if !rest.is_at_end() {
        return Err(rest.error(ParseErrorKind::InvalidToken).into());
    }
    Ok(value)
}

/// Parses one record from the start of `input` into `value` and returns
/// the number of bytes consumed, so several records can be read from one
/// string.
pub fn read_text<T: Reflect>(value: &mut T, input: &str) -> Result<usize, CodecError> {
    let mut reader = TextReader::new(input);
    match T::descriptor().access().read_text(value, &mut reader) {
        Ok(()) => Ok(reader.position()),
        Err(err) => {
            tracing::debug!(
                descriptor = T::descriptor().name(),
                error = %err,
                "text decode failed"
            );
            Err(err)
        }
    }
}

/// Renders each record on its own line.
pub fn write_records<'a, T, I>(records: I) -> Result<String, CodecError>
where
    T: Reflect,
    I: IntoIterator<Item = &'a T>,
{
    let mut out = String::new();
    for record in records {
        T::descriptor().access().write_text(record, &mut out)?;
        out.push('\n');
    }
    Ok(out)
}

/// Parses one record per line, stopping at the first blank line or at the
/// end of the input.
pub fn read_records<T: Reflect>(input: &str) -> Result<Vec<T>, CodecError> {
    let mut records = Vec::new();
    for line in input.lines() {
        if line.trim().is_empty() {
            break;
        }
        records.push(from_text(line)?);
    }
    tracing::trace!(
        descriptor = T::descriptor().name(),
        count = records.len(),
        "read text records"
    );
    Ok(records)
}

/// Appends `text` to `out` as a quoted string.
pub fn quote(text: &str, out: &mut String) {
    out.reserve(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}

// ---------------------------------------------------------------------------
// TextReader
// ---------------------------------------------------------------------------

/// A cursor over text input.
#[derive(Debug, Clone)]
pub struct TextReader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TextReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The input not yet consumed.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    pub fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consumes `ch` if it is next.
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes `ch`, or fails with `kind` (or `UnexpectedEnd` if the
    /// input is exhausted).
    pub fn expect(&mut self, ch: char, kind: ParseErrorKind) -> Result<(), ParseError> {
        match self.peek() {
            Some(next) if next == ch => {
                self.pos += ch.len_utf8();
                Ok(())
            }
            Some(_) => Err(self.error(kind)),
            None => Err(self.error(ParseErrorKind::UnexpectedEnd)),
        }
    }

    /// Consumes characters up to the next whitespace or closing bracket.
    pub fn take_token(&mut self) -> &'a str {
        let rest = self.remaining();
        let end = rest
            .find(|ch: char| ch.is_whitespace() || ch == ']' || ch == '}')
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Consumes a token and parses it as `T`.
    ///
    /// An empty token is `UnexpectedEnd` only when the input is exhausted;
    /// a closing bracket where a value belongs is `InvalidToken`.
    pub fn parse_token<T: FromStr>(&mut self) -> Result<T, ParseError> {
        let start = self.pos;
        let token = self.take_token();
        if token.is_empty() {
            let kind = if self.is_at_end() {
                ParseErrorKind::UnexpectedEnd
            } else {
                ParseErrorKind::InvalidToken
            };
            return Err(self.error(kind));
        }
        token
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidToken, start))
    }

    /// Consumes a quoted string and returns it with escapes removed.
    ///
    /// `\n` and `\r` stand for line breaks; any other escaped character
    /// stands for itself.
    pub fn read_quoted(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some('"') => self.pos += 1,
            Some(_) => return Err(self.error(ParseErrorKind::MissingOpenToken)),
            None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
        }

        let body = self.remaining();
        let mut out = String::new();
        let mut chars = body.char_indices();
        while let Some((index, ch)) = chars.next() {
            match ch {
                '"' => {
                    self.pos += index + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                other => out.push(other),
            }
        }
        Err(ParseError::new(ParseErrorKind::UnexpectedEnd, self.input.len()))
    }

    /// An error of `kind` at the cursor.
    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub(crate) fn write_members(
    descriptor: &TypeDescriptor,
    value: &dyn Any,
    out: &mut String,
) -> Result<(), CodecError> {
    out.push_str("[ ");
    for member in descriptor.members() {
        member.access().write_text(value, out)?;
    }
    out.push_str("] ");
    Ok(())
}

pub(crate) fn read_members(
    descriptor: &TypeDescriptor,
    value: &mut dyn Any,
    input: &mut TextReader<'_>,
) -> Result<(), CodecError> {
    input.skip_whitespace();
    input.expect('[', ParseErrorKind::MissingOpenToken)?;
    for member in descriptor.members() {
        input.skip_whitespace();
        if input.is_at_end() {
            return Err(input.error(ParseErrorKind::UnexpectedEnd).into());
        }
        member.access().read_text(value, input)?;
    }
    input.skip_whitespace();
    if !input.eat(']') {
        return Err(input.error(ParseErrorKind::MissingCloseToken).into());
    }
    Ok(())
}

pub(crate) fn write_collection(
    adapter: &dyn CollectionAdapter,
    collection: &dyn Any,
    out: &mut String,
) -> Result<(), CodecError> {
    out.push_str("{ ");
    if let Some(mut cursor) = adapter.begin_iteration(collection)? {
        loop {
            if let Some(element) = adapter.get_element(&cursor) {
                if let Err(err) = adapter.element().write_text(element, out) {
                    adapter.cleanup(&mut cursor);
                    return Err(err);
                }
            }
            if !adapter.increment(&mut cursor) {
                break;
            }
        }
    }
    out.push_str("} ");
    Ok(())
}

/// Replaces the contents of `collection` with the elements in `input`.
pub(crate) fn read_collection(
    adapter: &dyn CollectionAdapter,
    collection: &mut dyn Any,
    input: &mut TextReader<'_>,
) -> Result<(), CodecError> {
    input.skip_whitespace();
    input.expect('{', ParseErrorKind::MissingOpenToken)?;
    adapter.clear(collection)?;
    loop {
        input.skip_whitespace();
        if input.is_at_end() {
            return Err(input.error(ParseErrorKind::UnexpectedEnd).into());
        }
        if input.eat('}') {
            return Ok(());
        }
        adapter.append_from_text(collection, input)?;
    }
}
