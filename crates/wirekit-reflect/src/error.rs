//! Error types for the codec layer.
//!
//! Stream failures bubble up unchanged inside [`CodecError::Stream`], so a
//! caller can still tell an underflow from a malformed text record.

use std::fmt;

use wirekit_stream::StreamError;

/// Errors raised while encoding or decoding a described value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The underlying byte stream failed (underflow, read-only, oversized
    /// block, ...).
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// A text record is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A string payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// A collection holds more elements than a 4-byte count can describe.
    #[error("collection of {0} elements does not fit a 4-byte count")]
    CollectionTooLarge(usize),

    /// Bytes were left over after decoding a complete value.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),

    /// An accessor was handed a value of a different type than the one it
    /// describes.
    #[error("value is not a {expected}")]
    TypeMismatch { expected: &'static str },
}

impl CodecError {
    /// The parse failure kind, if this is a text parsing error.
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse(err) => Some(err.kind),
            _ => None,
        }
    }
}

/// A text record could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at byte {position}")]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte offset into the input where it went wrong.
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// The distinct ways a text record can be malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Expected `[`, `{` or `"` and found something else.
    MissingOpenToken,
    /// The input ended in the middle of a value.
    UnexpectedEnd,
    /// A structure did not end with `]` where its last member ended.
    MissingCloseToken,
    /// A scalar token does not parse as the member's type, or a complete
    /// record is followed by something other than whitespace.
    InvalidToken,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOpenToken => write!(f, "missing open token"),
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
            Self::MissingCloseToken => write!(f, "missing close token"),
            Self::InvalidToken => write!(f, "invalid token"),
        }
    }
}
